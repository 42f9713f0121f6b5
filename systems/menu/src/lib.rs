#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Numbered-choice menus used whenever a unit needs a player decision.
//!
//! A [`Menu`] pairs an ordered option list with a title. Selections arrive as
//! text tokens; [`MenuPrompt`] consumes them one at a time so terminal and
//! graphical front ends can drive the same state machine, while
//! [`Menu::get_result`] wraps it in the blocking re-prompt loop.

use std::fmt;

use skirmish_core::{CommandSource, SelectionError};

/// Ordered list of selectable options preceded by a title.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Menu<T> {
    title: String,
    options: Vec<T>,
}

impl<T> Menu<T> {
    /// Creates a menu offering `options` under `title`.
    #[must_use]
    pub fn new<S>(options: Vec<T>, title: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            title: title.into(),
            options,
        }
    }

    /// Title displayed above the options.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Options in presentation order.
    #[must_use]
    pub fn options(&self) -> &[T] {
        &self.options
    }

    /// Reports whether the menu has nothing to select.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Resolves a selection token into the option it addresses.
    pub fn pull(&self, token: &str) -> Result<&T, SelectionError> {
        let index = self.index_of(token)?;
        Ok(&self.options[index])
    }

    fn index_of(&self, token: &str) -> Result<usize, SelectionError> {
        let index: usize = token
            .trim()
            .parse()
            .map_err(|_| SelectionError::NotANumber(token.to_owned()))?;
        if index < self.options.len() {
            Ok(index)
        } else {
            Err(SelectionError::OutOfRange {
                index,
                len: self.options.len(),
            })
        }
    }

    /// Starts a fresh prompt over this menu.
    #[must_use]
    pub fn prompt_state(&self) -> MenuPrompt<'_, T> {
        MenuPrompt {
            menu: self,
            state: PromptState::Awaiting,
            failures: 0,
        }
    }
}

impl<T: Clone + fmt::Display> Menu<T> {
    /// Displays the menu once, then reads input until a valid selection is made.
    ///
    /// `fail` runs once for every rejected token. The loop never returns for a
    /// menu without options, so callers must check [`Menu::is_empty`] first.
    pub fn get_result<D, I, F>(&self, display: D, mut input: I, mut fail: F) -> T
    where
        D: FnOnce(&Self),
        I: FnMut() -> String,
        F: FnMut(),
    {
        display(self);
        let mut prompt = self.prompt_state();
        loop {
            match prompt.submit(&input()) {
                PromptState::Resolved(index) => return self.options[index].clone(),
                PromptState::Invalid(_) => fail(),
                PromptState::Awaiting => {}
            }
        }
    }

    /// Runs [`Menu::get_result`] against a command source.
    pub fn prompt<S>(&self, source: &mut S) -> T
    where
        S: CommandSource + ?Sized,
    {
        source.present(&self.to_string());
        let mut prompt = self.prompt_state();
        loop {
            let token = source.next_token();
            match prompt.submit(&token) {
                PromptState::Resolved(index) => return self.options[index].clone(),
                PromptState::Invalid(error) => {
                    tracing::debug!(%error, "rejected menu selection");
                    source.reject();
                }
                PromptState::Awaiting => {}
            }
        }
    }
}

impl<T: fmt::Display> fmt::Display for Menu<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.title)?;
        for (number, item) in self.options.iter().enumerate() {
            writeln!(f, "{number}: {item}")?;
        }
        Ok(())
    }
}

/// Observable state of an in-progress menu prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromptState {
    /// No token has been submitted yet.
    Awaiting,
    /// The last token was rejected; the prompt expects another.
    Invalid(SelectionError),
    /// A valid selection was made; holds the chosen option index.
    Resolved(usize),
}

/// Incremental re-prompt loop over a [`Menu`].
#[derive(Debug)]
pub struct MenuPrompt<'a, T> {
    menu: &'a Menu<T>,
    state: PromptState,
    failures: u32,
}

impl<'a, T> MenuPrompt<'a, T> {
    /// Feeds one token into the prompt and returns the resulting state.
    ///
    /// Tokens submitted after resolution leave the prompt resolved.
    pub fn submit(&mut self, token: &str) -> PromptState {
        if let PromptState::Resolved(_) = self.state {
            return self.state.clone();
        }

        self.state = match self.menu.index_of(token) {
            Ok(index) => PromptState::Resolved(index),
            Err(error) => {
                self.failures = self.failures.saturating_add(1);
                PromptState::Invalid(error)
            }
        };
        self.state.clone()
    }

    /// Current state of the prompt.
    #[must_use]
    pub fn state(&self) -> &PromptState {
        &self.state
    }

    /// Number of tokens rejected so far.
    #[must_use]
    pub const fn failures(&self) -> u32 {
        self.failures
    }

    /// Selected option once the prompt resolved.
    #[must_use]
    pub fn selection(&self) -> Option<&'a T> {
        match self.state {
            PromptState::Resolved(index) => self.menu.options.get(index),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stooges() -> Menu<&'static str> {
        Menu::new(vec!["Larry", "Moe", "Curly"], "Stooges")
    }

    #[test]
    fn pull_accepts_indices_in_range() {
        let menu = stooges();
        assert_eq!(menu.pull("0"), Ok(&"Larry"));
        assert_eq!(menu.pull("2"), Ok(&"Curly"));
    }

    #[test]
    fn pull_rejects_out_of_range_and_text() {
        let menu = stooges();
        assert_eq!(
            menu.pull("3"),
            Err(SelectionError::OutOfRange { index: 3, len: 3 })
        );
        assert_eq!(
            menu.pull("-1"),
            Err(SelectionError::NotANumber("-1".to_owned()))
        );
        assert!(matches!(menu.pull(""), Err(SelectionError::NotANumber(_))));
    }

    #[test]
    fn prompt_state_tracks_failures_until_resolved() {
        let menu = stooges();
        let mut prompt = menu.prompt_state();
        assert_eq!(prompt.state(), &PromptState::Awaiting);

        assert!(matches!(prompt.submit("x"), PromptState::Invalid(_)));
        assert_eq!(prompt.selection(), None);
        assert_eq!(prompt.submit("2"), PromptState::Resolved(2));
        assert_eq!(prompt.submit("0"), PromptState::Resolved(2));

        assert_eq!(prompt.failures(), 1);
        assert_eq!(prompt.selection(), Some(&"Curly"));
    }

    #[test]
    fn empty_menu_renders_title_only() {
        let menu: Menu<u8> = Menu::new(Vec::new(), "Nothing");
        assert!(menu.is_empty());
        assert_eq!(menu.to_string(), "Nothing:\n");
    }
}

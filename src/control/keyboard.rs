// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Keyboard shortcut handling.
//!
//! Provides the player's key bindings, grouped by category for the help bar.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyModifiers};

use super::PlayerAction;

/// A keyboard shortcut definition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcut {
    /// Key code
    pub code: KeyCode,
    /// Required modifiers
    pub modifiers: KeyModifiers,
}

impl Shortcut {
    /// Create a new shortcut
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Create a shortcut with no modifiers
    pub fn key(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    /// Create a shortcut with Ctrl modifier
    pub fn ctrl(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::CONTROL)
    }

    /// Create a shortcut with Shift modifier
    pub fn shift(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::SHIFT)
    }
}

/// A keyboard binding (shortcut to action)
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub shortcut: Shortcut,
    pub action: PlayerAction,
    /// Description for help display
    pub description: String,
    /// Category for grouping in help
    pub category: String,
}

impl KeyBinding {
    /// Create a new key binding
    pub fn new(shortcut: Shortcut, action: PlayerAction, description: impl Into<String>) -> Self {
        Self {
            shortcut,
            action,
            description: description.into(),
            category: "General".to_string(),
        }
    }

    /// Set the category
    pub fn category(mut self, cat: impl Into<String>) -> Self {
        self.category = cat.into();
        self
    }
}

/// Keyboard controller with configurable bindings
#[derive(Debug, Clone)]
pub struct KeyboardController {
    bindings: HashMap<Shortcut, KeyBinding>,
}

impl KeyboardController {
    /// Create an empty keyboard controller
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Create a keyboard controller with the player bindings
    pub fn with_defaults() -> Self {
        let mut controller = Self::new();
        controller.add_default_bindings();
        controller
    }

    fn add_default_bindings(&mut self) {
        use PlayerAction::*;

        let transport = [
            (Shortcut::key(KeyCode::Char(' ')), TogglePlay, "Play/Pause"),
            (Shortcut::key(KeyCode::Char('s')), Stop, "Stop / Rewind"),
            (Shortcut::key(KeyCode::Esc), Stop, "Stop / Rewind"),
        ];
        let navigation = [
            (Shortcut::key(KeyCode::Left), PrevBar, "Previous chord"),
            (Shortcut::key(KeyCode::Right), NextBar, "Next chord"),
            (Shortcut::key(KeyCode::Up), PrevSection, "Previous section"),
            (Shortcut::key(KeyCode::Down), NextSection, "Next section"),
            (Shortcut::shift(KeyCode::Left), PrevSection, "Previous section"),
            (Shortcut::shift(KeyCode::Right), NextSection, "Next section"),
        ];
        let tempo = [
            (Shortcut::key(KeyCode::Char('+')), TempoUp, "Tempo +1 BPM"),
            (Shortcut::key(KeyCode::Char('=')), TempoUp, "Tempo +1 BPM"),
            (Shortcut::key(KeyCode::Char('-')), TempoDown, "Tempo -1 BPM"),
            (Shortcut::key(KeyCode::Char('m')), ToggleMetronome, "Metronome"),
        ];
        let ui = [
            (Shortcut::key(KeyCode::Char('q')), Quit, "Quit"),
            (Shortcut::ctrl(KeyCode::Char('c')), Quit, "Quit"),
        ];

        for (category, group) in [
            ("Transport", &transport[..]),
            ("Navigation", &navigation[..]),
            ("Tempo", &tempo[..]),
            ("UI", &ui[..]),
        ] {
            for (shortcut, action, description) in group {
                self.add(KeyBinding::new(shortcut.clone(), *action, *description).category(category));
            }
        }
    }

    /// Add a key binding
    pub fn add(&mut self, binding: KeyBinding) {
        self.bindings.insert(binding.shortcut.clone(), binding);
    }

    /// Get action for a key event
    ///
    /// Shift on a character key is already reflected in the character, so it
    /// is ignored there ('+' arrives as Shift+'+' on most layouts).
    pub fn get_action(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<PlayerAction> {
        let modifiers = match code {
            KeyCode::Char(_) => modifiers.difference(KeyModifiers::SHIFT),
            _ => modifiers,
        };
        self.bindings
            .get(&Shortcut::new(code, modifiers))
            .map(|b| b.action)
    }

    /// Get all bindings for help display
    pub fn bindings(&self) -> impl Iterator<Item = &KeyBinding> {
        self.bindings.values()
    }

    /// Get bindings grouped by category
    pub fn bindings_by_category(&self) -> HashMap<String, Vec<&KeyBinding>> {
        let mut grouped: HashMap<String, Vec<&KeyBinding>> = HashMap::new();
        for binding in self.bindings.values() {
            grouped
                .entry(binding.category.clone())
                .or_default()
                .push(binding);
        }
        grouped
    }
}

impl Default for KeyboardController {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Format a shortcut for display
pub fn format_shortcut(shortcut: &Shortcut) -> String {
    let mut parts = Vec::new();

    if shortcut.modifiers.contains(KeyModifiers::CONTROL) {
        parts.push("Ctrl".to_string());
    }
    if shortcut.modifiers.contains(KeyModifiers::SHIFT) {
        parts.push("Shift".to_string());
    }

    let key = match shortcut.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_uppercase().to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::Left => "←".to_string(),
        KeyCode::Right => "→".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        _ => "?".to_string(),
    };

    parts.push(key);
    parts.join("+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcut_creation() {
        let s = Shortcut::key(KeyCode::Char('a'));
        assert_eq!(s.code, KeyCode::Char('a'));
        assert_eq!(s.modifiers, KeyModifiers::NONE);

        let s = Shortcut::ctrl(KeyCode::Char('c'));
        assert_eq!(s.modifiers, KeyModifiers::CONTROL);

        let s = Shortcut::shift(KeyCode::Left);
        assert_eq!(s.modifiers, KeyModifiers::SHIFT);
    }

    fn action(code: KeyCode, modifiers: KeyModifiers) -> Option<PlayerAction> {
        KeyboardController::with_defaults().get_action(code, modifiers)
    }

    #[test]
    fn test_default_transport_keys() {
        assert_eq!(action(KeyCode::Char(' '), KeyModifiers::NONE), Some(PlayerAction::TogglePlay));
        assert_eq!(action(KeyCode::Char('s'), KeyModifiers::NONE), Some(PlayerAction::Stop));
        assert_eq!(action(KeyCode::Esc, KeyModifiers::NONE), Some(PlayerAction::Stop));
        assert_eq!(action(KeyCode::Char('q'), KeyModifiers::NONE), Some(PlayerAction::Quit));
        assert_eq!(action(KeyCode::Char('c'), KeyModifiers::CONTROL), Some(PlayerAction::Quit));
        assert_eq!(action(KeyCode::Char('c'), KeyModifiers::NONE), None);
        assert_eq!(action(KeyCode::Char('z'), KeyModifiers::NONE), None);
    }

    #[test]
    fn test_default_navigation_keys() {
        assert_eq!(action(KeyCode::Left, KeyModifiers::NONE), Some(PlayerAction::PrevBar));
        assert_eq!(action(KeyCode::Right, KeyModifiers::NONE), Some(PlayerAction::NextBar));
        assert_eq!(action(KeyCode::Right, KeyModifiers::SHIFT), Some(PlayerAction::NextSection));
        assert_eq!(action(KeyCode::Up, KeyModifiers::NONE), Some(PlayerAction::PrevSection));
        assert_eq!(action(KeyCode::Down, KeyModifiers::NONE), Some(PlayerAction::NextSection));
        // Ctrl is not stripped like Shift
        assert_eq!(action(KeyCode::Left, KeyModifiers::CONTROL), None);
    }

    #[test]
    fn test_default_tempo_keys() {
        assert_eq!(action(KeyCode::Char('='), KeyModifiers::NONE), Some(PlayerAction::TempoUp));
        assert_eq!(action(KeyCode::Char('-'), KeyModifiers::NONE), Some(PlayerAction::TempoDown));
        assert_eq!(
            action(KeyCode::Char('m'), KeyModifiers::NONE),
            Some(PlayerAction::ToggleMetronome)
        );
    }

    #[test]
    fn test_controller_ignores_shift_on_chars() {
        let controller = KeyboardController::with_defaults();
        assert_eq!(
            controller.get_action(KeyCode::Char('+'), KeyModifiers::SHIFT),
            Some(PlayerAction::TempoUp)
        );
        assert_eq!(
            controller.get_action(KeyCode::Left, KeyModifiers::SHIFT),
            Some(PlayerAction::PrevSection)
        );
    }

    #[test]
    fn test_add_binding() {
        let mut controller = KeyboardController::new();
        controller.add(KeyBinding::new(
            Shortcut::key(KeyCode::Char('x')),
            PlayerAction::Stop,
            "Custom Stop",
        ));
        assert_eq!(
            controller.get_action(KeyCode::Char('x'), KeyModifiers::NONE),
            Some(PlayerAction::Stop)
        );
        assert!(controller.get_action(KeyCode::Char(' '), KeyModifiers::NONE).is_none());
    }

    #[test]
    fn test_format_shortcut() {
        assert_eq!(format_shortcut(&Shortcut::key(KeyCode::Char(' '))), "Space");
        assert_eq!(format_shortcut(&Shortcut::ctrl(KeyCode::Char('c'))), "Ctrl+C");
        assert_eq!(format_shortcut(&Shortcut::shift(KeyCode::Left)), "Shift+←");
    }

    #[test]
    fn test_bindings_by_category() {
        let controller = KeyboardController::with_defaults();
        let grouped = controller.bindings_by_category();
        assert!(grouped.contains_key("Transport"));
        assert!(grouped.contains_key("Navigation"));
        assert!(grouped.contains_key("Tempo"));
        assert_eq!(grouped["UI"].len(), 2);
    }
}

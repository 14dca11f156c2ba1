use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::action::StepAction;

/// Server region a story belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Jp,
    En,
    Tw,
    Cn,
    Kr,
}

impl Locale {
    pub const ALL: [Locale; 5] = [Self::Jp, Self::En, Self::Tw, Self::Cn, Self::Kr];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jp => "jp",
            Self::En => "en",
            Self::Tw => "tw",
            Self::Cn => "cn",
            Self::Kr => "kr",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown locale {s:?} (expected one of jp, en, tw, cn, kr)"))
    }
}

/// A story document: a locale plus an ordered sequence of step actions.
///
/// Producers build it by appending with [`Story::emit`]; every consumer
/// reads it through [`Story::actions`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    locale: Locale,
    #[serde(default)]
    actions: Vec<StepAction>,
}

impl Story {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            actions: Vec::new(),
        }
    }

    pub fn from_actions(locale: Locale, actions: Vec<StepAction>) -> Self {
        Self { locale, actions }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn actions(&self) -> &[StepAction] {
        &self.actions
    }

    /// Append one action to the top-level sequence.
    pub fn emit(&mut self, action: StepAction) {
        self.actions.push(action);
    }

    pub fn emit_all(&mut self, actions: impl IntoIterator<Item = StepAction>) {
        self.actions.extend(actions);
    }

    /// Visit every action, including nested ones, in pre-order.
    pub fn walk<'a>(&'a self, mut f: impl FnMut(&'a StepAction)) {
        for action in &self.actions {
            action.walk(&mut f);
        }
    }

    pub fn into_actions(self) -> Vec<StepAction> {
        self.actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_appends_in_order() {
        let mut story = Story::new(Locale::En);
        story.emit(StepAction::WaitForTap);
        story.emit_all([StepAction::WaitForAll, StepAction::Delay { seconds: 1.5 }]);
        let names: Vec<_> = story.actions().iter().map(StepAction::name).collect();
        assert_eq!(names, ["waitForTap", "waitForAll", "delay"]);
        assert_eq!(story.locale(), Locale::En);
    }

    #[test]
    fn locale_parses_case_insensitively() {
        assert_eq!("JP".parse::<Locale>(), Ok(Locale::Jp));
        assert_eq!("kr".parse::<Locale>(), Ok(Locale::Kr));
        assert!("de".parse::<Locale>().is_err());
    }

    #[test]
    fn json_round_trip() {
        let story = Story::from_actions(
            Locale::Tw,
            vec![StepAction::ForkTask {
                actions: vec![StepAction::Telop { text: "Day 1".into() }],
            }],
        );
        let json = serde_json::to_string(&story).unwrap();
        let back: Story = serde_json::from_str(&json).unwrap();
        assert_eq!(back, story);
    }
}

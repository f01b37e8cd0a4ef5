//! Confirmation prompts as plain data
//!
//! A prompt is a title, a message and a list of action descriptors. Whoever
//! renders the modal only needs this table; choosing an action is reported
//! back to the controller as a [`SessionAction`].

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionAction {
    /// Close the prompt, keep playing.
    Cancel,
    QuitWithoutSaving,
    SaveAndQuit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionVariant {
    Default,
    Primary,
    Secondary,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptAction {
    pub label: &'static str,
    pub action: SessionAction,
    pub variant: ActionVariant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationPrompt {
    pub title: &'static str,
    pub message: &'static str,
    pub actions: Vec<PromptAction>,
}

const CANCEL: PromptAction = PromptAction {
    label: "Cancel",
    action: SessionAction::Cancel,
    variant: ActionVariant::Default,
};

impl ConfirmationPrompt {
    /// Shown when the player asks to quit. Saving is only offered when signed in.
    pub fn quit(signed_in: bool) -> Self {
        if signed_in {
            Self {
                title: "Quit Game?",
                message: "Do you want to save your progress before quitting?",
                actions: vec![
                    CANCEL,
                    PromptAction {
                        label: "Quit without Saving",
                        action: SessionAction::QuitWithoutSaving,
                        variant: ActionVariant::Secondary,
                    },
                    PromptAction {
                        label: "Save and Quit",
                        action: SessionAction::SaveAndQuit,
                        variant: ActionVariant::Primary,
                    },
                ],
            }
        } else {
            Self {
                title: "Quit Game?",
                message: "Your game progress will be lost as you are not signed in. Are you sure you want to quit?",
                actions: vec![
                    CANCEL,
                    PromptAction {
                        label: "Quit Game",
                        action: SessionAction::QuitWithoutSaving,
                        variant: ActionVariant::Danger,
                    },
                ],
            }
        }
    }

    /// Shown when the player navigates away from an active game.
    pub fn leave(signed_in: bool) -> Self {
        let mut prompt = Self::quit(signed_in);
        prompt.title = "Leave Game?";
        prompt.message = "Are you sure you want to leave? Your game progress might be lost.";
        prompt
    }

    pub fn offers(&self, action: SessionAction) -> bool {
        self.actions.iter().any(|a| a.action == action)
    }
}

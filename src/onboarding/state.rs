//! Onboarding state machine — tracks which step of the wizard the user is on.

use serde::{Deserialize, Serialize};

/// The steps of the onboarding wizard.
///
/// Progresses linearly: Welcome → Photos → About → Preferences → Submitted.
/// Going back one step is allowed from any step after Welcome, except once
/// the profile has been submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    Welcome,
    Photos,
    About,
    Preferences,
    Submitted,
}

impl OnboardingStep {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: OnboardingStep) -> bool {
        use OnboardingStep::*;
        matches!(
            (self, target),
            (Welcome, Photos)
                | (Photos, About)
                | (About, Preferences)
                | (Preferences, Submitted)
                // backward
                | (Photos, Welcome)
                | (About, Photos)
                | (Preferences, About)
        )
    }

    /// Whether this step is terminal (the profile has been saved).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted)
    }

    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<OnboardingStep> {
        use OnboardingStep::*;
        match self {
            Welcome => Some(Photos),
            Photos => Some(About),
            About => Some(Preferences),
            Preferences => Some(Submitted),
            Submitted => None,
        }
    }

    /// Get the step before this one, if going back is allowed.
    pub fn prev(&self) -> Option<OnboardingStep> {
        use OnboardingStep::*;
        match self {
            Photos => Some(Welcome),
            About => Some(Photos),
            Preferences => Some(About),
            Welcome | Submitted => None,
        }
    }

    /// Zero-based position shown in the progress bar. `None` once submitted.
    pub fn index(&self) -> Option<u8> {
        match self {
            Self::Welcome => Some(0),
            Self::Photos => Some(1),
            Self::About => Some(2),
            Self::Preferences => Some(3),
            Self::Submitted => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Welcome => "Welcome to loveSpark",
            Self::Photos => "Add your best photos",
            Self::About => "Tell us about yourself",
            Self::Preferences => "Your preferences",
            Self::Submitted => "You're all set",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Welcome => "Let's create your profile in a few simple steps",
            Self::Photos => "Upload photos that show the real you",
            Self::About => "Share some details to help find your perfect match",
            Self::Preferences => "Let us know what you're looking for",
            Self::Submitted => "Your profile has been created",
        }
    }
}

impl Default for OnboardingStep {
    fn default() -> Self {
        Self::Welcome
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Welcome => "welcome",
            Self::Photos => "photos",
            Self::About => "about",
            Self::Preferences => "preferences",
            Self::Submitted => "submitted",
        };
        write!(f, "{s}")
    }
}

/// Wizard progress plus the two concurrency gates.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WizardState {
    /// Current step.
    pub step: OnboardingStep,
    /// A profile submission is in flight.
    pub is_submitting: bool,
    /// Photo uploads currently in flight.
    pub uploads_in_flight: u32,
}

impl WizardState {
    /// True while any photo upload is still running.
    pub fn is_uploading(&self) -> bool {
        self.uploads_in_flight > 0
    }

    /// True while the profile is being saved or once it has been. The form
    /// is frozen in both cases.
    pub fn is_locked(&self) -> bool {
        self.is_submitting || self.step.is_terminal()
    }

    /// Advance to the next step. Returns an error if already terminal.
    pub fn advance(&mut self) -> Result<OnboardingStep, String> {
        let next = self
            .step
            .next()
            .ok_or_else(|| "Already at terminal step".to_string())?;
        if !self.step.can_transition_to(next) {
            return Err(format!("Cannot transition from {} to {}", self.step, next));
        }
        self.step = next;
        Ok(next)
    }

    /// Go back one step. Returns an error at Welcome or after submission.
    pub fn retreat(&mut self) -> Result<OnboardingStep, String> {
        let prev = self
            .step
            .prev()
            .ok_or_else(|| format!("Cannot go back from {}", self.step))?;
        self.step = prev;
        Ok(prev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use OnboardingStep::*;
        let transitions = [
            (Welcome, Photos),
            (Photos, About),
            (About, Preferences),
            (Preferences, Submitted),
            (Photos, Welcome),
            (About, Photos),
            (Preferences, About),
        ];
        for (from, to) in transitions {
            assert!(
                from.can_transition_to(to),
                "{from} should transition to {to}"
            );
        }
    }

    #[test]
    fn invalid_transitions() {
        use OnboardingStep::*;
        // Skip steps
        assert!(!Welcome.can_transition_to(About));
        assert!(!Photos.can_transition_to(Submitted));
        // Leave the terminal step
        assert!(!Submitted.can_transition_to(Preferences));
        assert!(!Submitted.can_transition_to(Welcome));
        // Self-transition
        assert!(!About.can_transition_to(About));
    }

    #[test]
    fn next_walks_all_steps() {
        use OnboardingStep::*;
        let mut current = Welcome;
        for expected_next in [Photos, About, Preferences, Submitted] {
            let next = current.next().unwrap();
            assert_eq!(next, expected_next);
            current = next;
        }
        assert!(current.next().is_none());
        assert!(current.is_terminal());
    }

    #[test]
    fn indices_cover_zero_to_three() {
        use OnboardingStep::*;
        let indices: Vec<_> = [Welcome, Photos, About, Preferences]
            .iter()
            .map(|s| s.index().unwrap())
            .collect();
        assert_eq!(indices, [0, 1, 2, 3]);
        assert_eq!(Submitted.index(), None);
    }

    #[test]
    fn display_matches_serde() {
        use OnboardingStep::*;
        for step in [Welcome, Photos, About, Preferences, Submitted] {
            let display = format!("{step}");
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{display}\""), json);
        }
    }

    #[test]
    fn locked_while_submitting_and_after() {
        let mut state = WizardState {
            step: OnboardingStep::Preferences,
            ..WizardState::default()
        };
        assert!(!state.is_locked());
        state.is_submitting = true;
        assert!(state.is_locked());
        state.is_submitting = false;
        state.step = OnboardingStep::Submitted;
        assert!(state.is_locked());
    }

    #[test]
    fn state_advance_and_retreat() {
        let mut state = WizardState::default();
        assert_eq!(state.step, OnboardingStep::Welcome);
        assert!(state.retreat().is_err());

        assert_eq!(state.advance().unwrap(), OnboardingStep::Photos);
        assert_eq!(state.advance().unwrap(), OnboardingStep::About);
        assert_eq!(state.retreat().unwrap(), OnboardingStep::Photos);
        assert_eq!(state.advance().unwrap(), OnboardingStep::About);
        assert_eq!(state.advance().unwrap(), OnboardingStep::Preferences);
        assert_eq!(state.advance().unwrap(), OnboardingStep::Submitted);

        assert!(state.advance().is_err());
        assert!(state.retreat().is_err());
    }

    #[test]
    fn uploading_tracks_in_flight_count() {
        let mut state = WizardState::default();
        assert!(!state.is_uploading());
        state.uploads_in_flight = 2;
        assert!(state.is_uploading());
    }
}

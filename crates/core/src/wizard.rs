//! Multi-step form wizards.
//!
//! A [`Wizard`] walks a fixed ordered list of steps while accumulating a
//! form value. Advancing validates only the step being left; the final
//! submission hands back the accumulated form.

use crate::error::CoreError;
use crate::models::character::CharacterDraft;
use crate::models::show::CreateShow;

/// A step enum with a fixed order.
pub trait WizardStep: Copy + Eq + std::fmt::Debug + 'static {
    /// All steps in order. Must be non-empty.
    const ALL: &'static [Self];

    fn label(self) -> &'static str;

    /// 1-based position of this step.
    fn to_number(self) -> u8 {
        Self::ALL
            .iter()
            .position(|s| *s == self)
            .map_or(0, |i| i as u8 + 1)
    }

    /// Convert a 1-based step number to a step.
    fn from_number(n: u8) -> Result<Self, CoreError> {
        usize::from(n)
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid step number {n}. Must be between 1 and {}",
                    Self::ALL.len()
                ))
            })
    }
}

/// Per-step validation over the accumulated form.
pub trait StepForm<S: WizardStep> {
    fn validate_step(&self, step: S) -> Result<(), CoreError>;
}

/// Wizard position plus accumulated form state.
#[derive(Debug, Clone)]
pub struct Wizard<S: WizardStep, F> {
    index: usize,
    form: F,
    _steps: std::marker::PhantomData<S>,
}

impl<S: WizardStep, F: StepForm<S>> Wizard<S, F> {
    pub fn new(form: F) -> Self {
        Self {
            index: 0,
            form,
            _steps: std::marker::PhantomData,
        }
    }

    pub fn current(&self) -> S {
        S::ALL[self.index]
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_final(&self) -> bool {
        self.index + 1 == S::ALL.len()
    }

    /// Validate the current step and move forward. The step is unchanged
    /// on error. Advancing from the final step is a no-op.
    pub fn advance(&mut self) -> Result<S, CoreError> {
        self.form.validate_step(self.current())?;
        if !self.is_final() {
            self.index += 1;
        }
        Ok(self.current())
    }

    /// Move back one step without validation.
    pub fn back(&mut self) -> S {
        self.index = self.index.saturating_sub(1);
        self.current()
    }

    /// Validate every step and return the accumulated form. Only allowed
    /// from the final step.
    pub fn finish(self) -> Result<F, CoreError> {
        if !self.is_final() {
            return Err(CoreError::Validation(format!(
                "Wizard is on step {} of {}",
                self.index + 1,
                S::ALL.len()
            )));
        }
        for step in S::ALL {
            self.form.validate_step(*step)?;
        }
        Ok(self.form)
    }
}

// ---------------------------------------------------------------------------
// Character creation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterStep {
    BasicInfo,
    Personality,
    Visual,
    Review,
}

impl WizardStep for CharacterStep {
    const ALL: &'static [Self] = &[
        Self::BasicInfo,
        Self::Personality,
        Self::Visual,
        Self::Review,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::BasicInfo => "Basic Info",
            Self::Personality => "Personality",
            Self::Visual => "Visual",
            Self::Review => "Review",
        }
    }
}

impl StepForm<CharacterStep> for CharacterDraft {
    fn validate_step(&self, step: CharacterStep) -> Result<(), CoreError> {
        match step {
            CharacterStep::BasicInfo if self.name.trim().is_empty() => {
                Err(CoreError::Validation("Character name is required".into()))
            }
            _ => Ok(()),
        }
    }
}

pub type CharacterWizard = Wizard<CharacterStep, CharacterDraft>;

// ---------------------------------------------------------------------------
// First-run onboarding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingStep {
    Welcome,
    CreateShow,
    CreateCharacter,
    SetupComplete,
}

impl OnboardingStep {
    /// Route the step is rendered at.
    pub fn path(self) -> &'static str {
        match self {
            Self::Welcome => "/onboarding/welcome",
            Self::CreateShow => "/onboarding/create-show",
            Self::CreateCharacter => "/onboarding/create-character",
            Self::SetupComplete => "/onboarding/setup-complete",
        }
    }
}

impl WizardStep for OnboardingStep {
    const ALL: &'static [Self] = &[
        Self::Welcome,
        Self::CreateShow,
        Self::CreateCharacter,
        Self::SetupComplete,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Welcome => "Welcome",
            Self::CreateShow => "Create Show",
            Self::CreateCharacter => "Create Character",
            Self::SetupComplete => "Setup Complete",
        }
    }
}

/// Everything the onboarding flow collects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OnboardingDraft {
    pub show: CreateShowDraft,
    pub character: CharacterDraft,
}

/// Show fields as typed during onboarding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateShowDraft {
    pub name: String,
    pub description: String,
    pub target_age: Option<String>,
    pub style_prompt: Option<String>,
}

impl From<CreateShowDraft> for CreateShow {
    fn from(draft: CreateShowDraft) -> Self {
        CreateShow {
            name: draft.name,
            description: draft.description,
            target_age: draft.target_age,
            style_prompt: draft.style_prompt,
        }
    }
}

impl StepForm<OnboardingStep> for OnboardingDraft {
    fn validate_step(&self, step: OnboardingStep) -> Result<(), CoreError> {
        match step {
            OnboardingStep::CreateShow if self.show.description.trim().is_empty() => {
                Err(CoreError::Validation("Add a description first".into()))
            }
            OnboardingStep::CreateShow if self.show.name.trim().is_empty() => {
                Err(CoreError::Validation("Show name is required".into()))
            }
            OnboardingStep::CreateCharacter if self.character.name.trim().is_empty() => {
                Err(CoreError::Validation("Add a name first".into()))
            }
            _ => Ok(()),
        }
    }
}

pub type OnboardingWizard = Wizard<OnboardingStep, OnboardingDraft>;

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    // ---- Test: character wizard ----

    #[test]
    fn basic_info_requires_name() {
        let mut wizard = CharacterWizard::new(CharacterDraft::default());
        assert_matches!(wizard.advance(), Err(CoreError::Validation(_)));
        assert_eq!(wizard.current(), CharacterStep::BasicInfo);

        wizard.form_mut().name = "Pip".into();
        assert_eq!(wizard.advance().unwrap(), CharacterStep::Personality);
    }

    #[test]
    fn later_steps_do_not_block() {
        let mut wizard = CharacterWizard::new(CharacterDraft {
            name: "Pip".into(),
            ..Default::default()
        });
        wizard.advance().unwrap();
        wizard.advance().unwrap();
        assert_eq!(wizard.advance().unwrap(), CharacterStep::Review);
        assert!(wizard.is_final());
        assert_eq!(wizard.advance().unwrap(), CharacterStep::Review);
    }

    #[test]
    fn back_saturates_at_first_step() {
        let mut wizard = CharacterWizard::new(CharacterDraft {
            name: "Pip".into(),
            ..Default::default()
        });
        wizard.advance().unwrap();
        assert_eq!(wizard.back(), CharacterStep::BasicInfo);
        assert_eq!(wizard.back(), CharacterStep::BasicInfo);
        assert!(wizard.is_first());
    }

    #[test]
    fn finish_returns_accumulated_form() {
        let mut wizard = CharacterWizard::new(CharacterDraft::default());
        wizard.form_mut().name = "Pip".into();
        wizard.advance().unwrap();
        wizard.form_mut().toggle_trait("brave");
        wizard.advance().unwrap();
        wizard.form_mut().visual_description = Some("small fox".into());
        wizard.advance().unwrap();

        let draft = wizard.finish().unwrap();
        assert_eq!(draft.personality_traits, vec!["brave".to_string()]);
        assert_eq!(draft.visual_description.as_deref(), Some("small fox"));
    }

    #[test]
    fn finish_before_final_step_fails() {
        let wizard = CharacterWizard::new(CharacterDraft {
            name: "Pip".into(),
            ..Default::default()
        });
        assert_matches!(wizard.finish(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn step_numbers_round_trip() {
        assert_eq!(CharacterStep::Visual.to_number(), 3);
        assert_eq!(CharacterStep::from_number(4).unwrap(), CharacterStep::Review);
        assert!(CharacterStep::from_number(0).is_err());
        assert!(CharacterStep::from_number(5).is_err());
    }

    // ---- Test: onboarding wizard ----

    #[test]
    fn onboarding_requires_show_description_then_character_name() {
        let mut wizard = OnboardingWizard::new(OnboardingDraft::default());
        assert_eq!(wizard.advance().unwrap(), OnboardingStep::CreateShow);

        let err = wizard.advance().unwrap_err();
        assert_eq!(err.user_message(), "Add a description first");

        wizard.form_mut().show.description = "Foxes at sea".into();
        wizard.form_mut().show.name = "Pip Ahoy".into();
        assert_eq!(wizard.advance().unwrap(), OnboardingStep::CreateCharacter);

        assert_matches!(wizard.advance(), Err(CoreError::Validation(_)));
        wizard.form_mut().character.name = "Pip".into();
        assert_eq!(wizard.advance().unwrap(), OnboardingStep::SetupComplete);
        assert_eq!(wizard.current().path(), "/onboarding/setup-complete");
    }

    #[test]
    fn show_draft_converts_to_request() {
        let show: CreateShow = CreateShowDraft {
            name: "Pip Ahoy".into(),
            description: "Foxes at sea".into(),
            ..Default::default()
        }
        .into();
        assert_eq!(show.name, "Pip Ahoy");
    }
}

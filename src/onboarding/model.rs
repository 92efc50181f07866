//! Profile form data collected during onboarding, plus its validation rules.

use serde::{Deserialize, Serialize};

use crate::backend::{ProfileSubmission, UserId};

/// Number of photo slots on the Photos step.
pub const PHOTO_SLOTS: usize = 6;
/// Photos required before leaving the Photos step.
pub const MIN_PHOTOS: usize = 3;
/// Minimum age to create a profile.
pub const MIN_AGE: u32 = 18;

/// Bounds for the "show me people aged" slider.
pub const PREF_AGE_MIN: u8 = 18;
pub const PREF_AGE_MAX: u8 = 80;
/// Bounds for the maximum distance slider, in miles.
pub const DISTANCE_MIN: u32 = 5;
pub const DISTANCE_MAX: u32 = 100;

pub mod messages {
    pub const PHOTOS_REQUIRED: &str = "Please upload at least 3 photos before continuing.";
    pub const NAME_REQUIRED: &str = "Name is required";
    pub const AGE_REQUIRED: &str = "Age is required";
    pub const AGE_INVALID: &str = "Please enter a valid age";
    pub const AGE_TOO_YOUNG: &str = "You must be at least 18 years old";
}

/// Who the user wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Women,
    Men,
    All,
}

impl Default for Gender {
    fn default() -> Self {
        Self::All
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Women => write!(f, "women"),
            Self::Men => write!(f, "men"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Fixed set of photo slots. Each slot holds the public URL of an uploaded
/// image, or nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoSlots([Option<String>; PHOTO_SLOTS]);

impl PhotoSlots {
    pub fn get(&self, slot: usize) -> Option<&str> {
        self.0.get(slot).and_then(|s| s.as_deref())
    }

    /// Store `url` in `slot`, replacing whatever was there. Returns false if
    /// the slot does not exist.
    pub fn set(&mut self, slot: usize, url: String) -> bool {
        match self.0.get_mut(slot) {
            Some(entry) => {
                *entry = Some(url);
                true
            }
            None => false,
        }
    }

    /// Empty `slot`. Returns false if the slot does not exist.
    pub fn clear(&mut self, slot: usize) -> bool {
        match self.0.get_mut(slot) {
            Some(entry) => {
                *entry = None;
                true
            }
            None => false,
        }
    }

    pub fn filled_count(&self) -> usize {
        self.0.iter().filter(|s| s.is_some()).count()
    }

    /// Non-empty slots, in slot order.
    pub fn urls(&self) -> Vec<String> {
        self.0.iter().flatten().cloned().collect()
    }
}

/// Interest tags. Insertion-ordered, no duplicates, no blanks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Interests(Vec<String>);

impl Interests {
    /// Add a tag. Returns false for blank or already-present tags.
    pub fn insert(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.contains(tag) {
            return false;
        }
        self.0.push(tag.to_string());
        true
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        let before = self.0.len();
        self.0.retain(|t| t != tag);
        self.0.len() != before
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    /// Replace every tag.
    pub fn replace<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.0.clear();
        for tag in tags {
            self.insert(tag.as_ref());
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Matching preferences. The setters keep every value inside its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Inclusive `(min, max)`.
    pub age_range: (u8, u8),
    /// Maximum distance in miles.
    pub distance: u32,
    pub gender: Gender,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            age_range: (18, 50),
            distance: 25,
            gender: Gender::All,
        }
    }
}

impl Preferences {
    pub fn set_age_range(&mut self, min: u8, max: u8) {
        let min = min.clamp(PREF_AGE_MIN, PREF_AGE_MAX);
        let max = max.clamp(PREF_AGE_MIN, PREF_AGE_MAX);
        self.age_range = (min.min(max), min.max(max));
    }

    pub fn set_distance(&mut self, miles: u32) {
        self.distance = miles.clamp(DISTANCE_MIN, DISTANCE_MAX);
    }
}

/// Everything the user has entered so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingFormData {
    pub name: String,
    /// Raw text of the age field.
    pub age: String,
    pub location: String,
    pub bio: String,
    pub photos: PhotoSlots,
    pub interests: Interests,
    pub preferences: Preferences,
}

impl OnboardingFormData {
    /// Apply a single field edit.
    pub fn apply(&mut self, update: FieldUpdate) {
        match update {
            FieldUpdate::Name(name) => self.name = name,
            FieldUpdate::Age(age) => self.age = age,
            FieldUpdate::Location(location) => self.location = location,
            FieldUpdate::Bio(bio) => self.bio = bio,
            FieldUpdate::Interests(tags) => self.interests.replace(tags),
            FieldUpdate::AddInterest(tag) => {
                self.interests.insert(&tag);
            }
            FieldUpdate::RemoveInterest(tag) => {
                self.interests.remove(&tag);
            }
            FieldUpdate::Gender(gender) => self.preferences.gender = gender,
            FieldUpdate::Distance(miles) => self.preferences.set_distance(miles),
            FieldUpdate::AgeRange(min, max) => self.preferences.set_age_range(min, max),
        }
    }

    /// Age as a number, if the field holds one.
    pub fn parsed_age(&self) -> Option<u32> {
        parse_age(&self.age)
    }

    /// Build the record saved to the profile table.
    pub fn to_submission(&self, id: UserId) -> ProfileSubmission {
        let gender = match self.preferences.gender {
            Gender::All => None,
            other => Some(other),
        };
        ProfileSubmission {
            id,
            name: self.name.trim().to_string(),
            age: self.parsed_age(),
            location: self.location.trim().to_string(),
            bio: self.bio.trim().to_string(),
            gender,
            interests: self.interests.as_slice().to_vec(),
            images: self.photos.urls(),
        }
    }
}

/// Per-field validation messages. Empty means the form is valid so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormErrors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photos: Option<String>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none() && self.photos.is_none()
    }
}

/// A single edit to the form, as sent by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldUpdate {
    Name(String),
    Age(String),
    Location(String),
    Bio(String),
    Interests(Vec<String>),
    AddInterest(String),
    RemoveInterest(String),
    Gender(Gender),
    Distance(u32),
    AgeRange(u8, u8),
}

fn parse_age(raw: &str) -> Option<u32> {
    raw.trim().parse().ok()
}

/// Photos step: at least [`MIN_PHOTOS`] slots filled.
pub fn validate_photos(form: &OnboardingFormData) -> Option<String> {
    (form.photos.filled_count() < MIN_PHOTOS).then(|| messages::PHOTOS_REQUIRED.to_string())
}

pub fn validate_name(form: &OnboardingFormData) -> Option<String> {
    form.name
        .trim()
        .is_empty()
        .then(|| messages::NAME_REQUIRED.to_string())
}

pub fn validate_age(form: &OnboardingFormData) -> Option<String> {
    let raw = form.age.trim();
    if raw.is_empty() {
        return Some(messages::AGE_REQUIRED.to_string());
    }
    match parse_age(raw) {
        None => Some(messages::AGE_INVALID.to_string()),
        Some(age) if age < MIN_AGE => Some(messages::AGE_TOO_YOUNG.to_string()),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_with_age(age: &str) -> OnboardingFormData {
        OnboardingFormData {
            age: age.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn age_rules() {
        assert_eq!(
            validate_age(&form_with_age("")).as_deref(),
            Some(messages::AGE_REQUIRED)
        );
        assert_eq!(
            validate_age(&form_with_age("  ")).as_deref(),
            Some(messages::AGE_REQUIRED)
        );
        assert_eq!(
            validate_age(&form_with_age("twenty")).as_deref(),
            Some(messages::AGE_INVALID)
        );
        assert_eq!(
            validate_age(&form_with_age("-4")).as_deref(),
            Some(messages::AGE_INVALID)
        );
        assert_eq!(
            validate_age(&form_with_age("17")).as_deref(),
            Some(messages::AGE_TOO_YOUNG)
        );
        assert_eq!(validate_age(&form_with_age("18")), None);
        assert_eq!(validate_age(&form_with_age(" 42 ")), None);
    }

    #[test]
    fn name_must_not_be_blank() {
        let mut form = OnboardingFormData::default();
        assert!(validate_name(&form).is_some());
        form.name = "   ".to_string();
        assert!(validate_name(&form).is_some());
        form.name = "Ada".to_string();
        assert!(validate_name(&form).is_none());
    }

    #[test]
    fn photos_need_three_slots() {
        let mut form = OnboardingFormData::default();
        form.photos.set(0, "a".to_string());
        form.photos.set(4, "b".to_string());
        assert!(validate_photos(&form).is_some());
        form.photos.set(5, "c".to_string());
        assert!(validate_photos(&form).is_none());
        assert_eq!(form.photos.urls(), ["a", "b", "c"]);
    }

    #[test]
    fn photo_slots_bounds() {
        let mut photos = PhotoSlots::default();
        assert!(!photos.set(PHOTO_SLOTS, "x".to_string()));
        assert!(!photos.clear(PHOTO_SLOTS));
        assert!(photos.set(2, "x".to_string()));
        assert!(photos.set(2, "y".to_string()));
        assert_eq!(photos.get(2), Some("y"));
        assert_eq!(photos.filled_count(), 1);
        assert!(photos.clear(2));
        assert_eq!(photos.filled_count(), 0);
    }

    #[test]
    fn interests_dedupe_and_trim() {
        let mut interests = Interests::default();
        assert!(interests.insert("Hiking"));
        assert!(!interests.insert(" Hiking "));
        assert!(!interests.insert(""));
        assert!(interests.insert("Jazz"));
        assert_eq!(interests.as_slice(), ["Hiking", "Jazz"]);

        assert!(interests.remove("Hiking"));
        assert!(!interests.remove("Hiking"));

        interests.replace(["a", "b", "a"]);
        assert_eq!(interests.as_slice(), ["a", "b"]);
    }

    #[test]
    fn preferences_clamp() {
        let mut prefs = Preferences::default();
        assert_eq!(prefs.age_range, (18, 50));
        assert_eq!(prefs.distance, 25);
        assert_eq!(prefs.gender, Gender::All);

        prefs.set_age_range(60, 25);
        assert_eq!(prefs.age_range, (25, 60));
        prefs.set_age_range(10, 99);
        assert_eq!(prefs.age_range, (18, 80));

        prefs.set_distance(1);
        assert_eq!(prefs.distance, DISTANCE_MIN);
        prefs.set_distance(500);
        assert_eq!(prefs.distance, DISTANCE_MAX);
    }

    #[test]
    fn field_update_wire_format() {
        let update: FieldUpdate =
            serde_json::from_str(r#"{"field":"name","value":"Sam"}"#).unwrap();
        assert_eq!(update, FieldUpdate::Name("Sam".to_string()));

        let update: FieldUpdate =
            serde_json::from_str(r#"{"field":"age_range","value":[21,35]}"#).unwrap();
        assert_eq!(update, FieldUpdate::AgeRange(21, 35));

        let update: FieldUpdate =
            serde_json::from_str(r#"{"field":"gender","value":"women"}"#).unwrap();
        assert_eq!(update, FieldUpdate::Gender(Gender::Women));
    }

    #[test]
    fn submission_maps_all_to_no_gender() {
        let mut form = OnboardingFormData {
            name: " Sam ".to_string(),
            age: "29".to_string(),
            ..Default::default()
        };
        form.photos.set(1, "u1".to_string());
        form.interests.insert("Travel");

        let submission = form.to_submission(UserId::new("id-1"));
        assert_eq!(submission.name, "Sam");
        assert_eq!(submission.age, Some(29));
        assert_eq!(submission.gender, None);
        assert_eq!(submission.images, ["u1"]);
        assert_eq!(submission.interests, ["Travel"]);

        form.apply(FieldUpdate::Gender(Gender::Men));
        let submission = form.to_submission(UserId::new("id-1"));
        assert_eq!(submission.gender, Some(Gender::Men));
    }
}

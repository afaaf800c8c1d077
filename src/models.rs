use crate::auth::Role;
use crate::errors::{ApiError, StoreError, ValidationErrors};
use bson::Document as BsonDocument;
use serde::{Deserialize, Serialize};

pub const BOOTCAMPS: &str = "bootcamps";
pub const COURSES: &str = "courses";
pub const REVIEWS: &str = "reviews";
pub const USERS: &str = "users";

/// Career tracks a bootcamp may offer.
pub const CAREERS: [&str; 6] = [
    "Web Development",
    "Mobile Development",
    "UI/UX",
    "Data Science",
    "Business",
    "Other",
];

pub const MINIMUM_SKILLS: [&str; 3] = ["beginner", "intermediate", "advanced"];

/// Field-level validation producing one message per invalid field.
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

/// Serializes a typed resource into the payload stored in a collection.
pub fn to_document<T: Serialize>(value: &T) -> Result<BsonDocument, StoreError> {
    Ok(bson::to_document(value)?)
}

/// A GeoJSON-style point with optional address parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "type", default = "point_type")]
    pub kind: String,
    /// Longitude first, latitude second.
    pub coordinates: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zipcode: Option<String>,
}

fn point_type() -> String {
    "Point".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootcampInput {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default)]
    pub careers: Vec<String>,
    #[serde(default)]
    pub average_cost: Option<f64>,
    #[serde(default)]
    pub housing: bool,
    #[serde(default)]
    pub job_assistance: bool,
    #[serde(default)]
    pub job_guarantee: bool,
}

impl Validate for BootcampInput {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.push("name", "is required");
        } else if self.name.len() > 50 {
            errors.push("name", "can not be more than 50 characters");
        }
        if self.description.trim().is_empty() {
            errors.push("description", "is required");
        } else if self.description.len() > 500 {
            errors.push("description", "can not be more than 500 characters");
        }
        if let Some(website) = &self.website {
            if !website.starts_with("http://") && !website.starts_with("https://") {
                errors.push("website", "must be a valid URL with http or https");
            }
        }
        if let Some(email) = &self.email {
            if !looks_like_email(email) {
                errors.push("email", "must be a valid email");
            }
        }
        for career in &self.careers {
            if !CAREERS.contains(&career.as_str()) {
                errors.push("careers", format!("{career} is not a supported career"));
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseInput {
    pub title: String,
    pub description: String,
    pub weeks: u32,
    pub tuition: f64,
    pub minimum_skill: String,
    #[serde(default)]
    pub scholarship_available: bool,
}

impl Validate for CourseInput {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        if self.title.trim().is_empty() {
            errors.push("title", "is required");
        }
        if self.description.trim().is_empty() {
            errors.push("description", "is required");
        }
        if self.weeks == 0 {
            errors.push("weeks", "must be at least 1");
        }
        if self.tuition < 0.0 {
            errors.push("tuition", "can not be negative");
        }
        if !MINIMUM_SKILLS.contains(&self.minimum_skill.as_str()) {
            errors.push("minimum_skill", "must be one of beginner, intermediate, advanced");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewInput {
    pub title: String,
    pub text: String,
    pub rating: i32,
}

impl Validate for ReviewInput {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        if self.title.trim().is_empty() {
            errors.push("title", "is required");
        } else if self.title.len() > 100 {
            errors.push("title", "can not be more than 100 characters");
        }
        if self.text.trim().is_empty() {
            errors.push("text", "is required");
        }
        if !(1..=10).contains(&self.rating) {
            errors.push("rating", "must be between 1 and 10");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

impl Validate for RegisterInput {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.push("name", "is required");
        }
        if !looks_like_email(&self.email) {
            errors.push("email", "must be a valid email");
        }
        if self.password.len() < 6 {
            errors.push("password", "must be at least 6 characters");
        }
        if self.role == Some(Role::Admin) {
            errors.push("role", "must be user or publisher");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDetailsInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Validate for UpdateDetailsInput {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                errors.push("name", "can not be empty");
            }
        }
        if let Some(email) = &self.email {
            if !looks_like_email(email) {
                errors.push("email", "must be a valid email");
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

impl Validate for UpdatePasswordInput {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        if self.new_password.len() < 6 {
            errors.push("new_password", "must be at least 6 characters");
        }
        errors.into_result()
    }
}

/// Admin-created user; unlike registration, any role is allowed.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInput {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

impl Validate for UserInput {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.push("name", "is required");
        }
        if !looks_like_email(&self.email) {
            errors.push("email", "must be a valid email");
        }
        if self.password.len() < 6 {
            errors.push("password", "must be at least 6 characters");
        }
        errors.into_result()
    }
}

pub(crate) fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else { return false };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bootcamp() -> BootcampInput {
        BootcampInput {
            name: "Devworks".into(),
            description: "Full-stack training".into(),
            website: Some("https://devworks.example".into()),
            phone: None,
            email: Some("hello@devworks.example".into()),
            address: None,
            location: None,
            careers: vec!["Web Development".into()],
            average_cost: Some(9000.0),
            housing: true,
            job_assistance: false,
            job_guarantee: false,
        }
    }

    #[test]
    fn valid_bootcamp_passes() {
        bootcamp().validate().unwrap();
    }

    #[test]
    fn invalid_fields_aggregate_one_message_each() {
        let mut input = bootcamp();
        input.name = String::new();
        input.website = Some("ftp://nope".into());
        input.careers = vec!["Juggling".into()];
        let err = input.validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("name:"));
        assert!(msg.contains("website:"));
        assert!(msg.contains("careers:"));
    }

    #[test]
    fn review_rating_bounds() {
        let mut review =
            ReviewInput { title: "Great".into(), text: "Loved it".into(), rating: 10 };
        review.validate().unwrap();
        review.rating = 0;
        assert!(review.validate().is_err());
        review.rating = 11;
        assert!(review.validate().is_err());
    }

    #[test]
    fn registration_rejects_admin_role() {
        let input = RegisterInput {
            name: "Eve".into(),
            email: "eve@example.com".into(),
            password: "hunter22".into(),
            role: Some(Role::Admin),
        };
        assert!(input.validate().is_err());
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Workout upload form.

use crate::error::WorkflowError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

/// Raw upload form fields, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct WorkoutForm {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(min = 1, message = "Steps are required"))]
    pub steps: String,
    #[validate(length(min = 1, message = "Duration is required"))]
    pub duration: String,
    #[validate(length(min = 1, message = "Calories are required"))]
    pub calories: String,
}

/// A validated workout ready for encryption and submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutSubmission {
    pub name: String,
    /// Secret: only ever leaves the process encrypted
    pub steps: u64,
    pub duration_minutes: u32,
    pub calories: u32,
}

impl WorkoutForm {
    /// Validate presence of every field and parse the numeric ones.
    pub fn validated(&self) -> Result<WorkoutSubmission, WorkflowError> {
        self.validate().map_err(|errors| {
            let mut messages: Vec<String> = errors
                .field_errors()
                .values()
                .flat_map(|errs| errs.iter())
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .collect();
            messages.sort();
            WorkflowError::Validation(messages.join(", "))
        })?;

        let steps = parse_field::<u64>("steps", &self.steps)?;
        let duration_minutes = parse_field::<u32>("duration", &self.duration)?;
        let calories = parse_field::<u32>("calories", &self.calories)?;

        if duration_minutes < 1 {
            return Err(WorkflowError::Validation(
                "Duration must be at least 1 minute".to_string(),
            ));
        }

        Ok(WorkoutSubmission {
            name: self.name.trim().to_string(),
            steps,
            duration_minutes,
            calories,
        })
    }
}

/// Names are stored trimmed, so whitespace alone counts as missing.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required")
            .with_message(Cow::Borrowed("Activity name is required")));
    }
    Ok(())
}

fn parse_field<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, WorkflowError> {
    raw.trim()
        .parse()
        .map_err(|_| WorkflowError::Validation(format!("{} must be a non-negative integer", field)))
}

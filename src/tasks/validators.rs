// src/tasks/validators.rs

use super::models::*;
use crate::common::{ValidationResult, Validator};

fn check_name(result: &mut ValidationResult, name: &str) {
    if name.trim().is_empty() {
        result.add_error("name", "Task name is required");
    } else if name.len() > 255 {
        result.add_error("name", "Task name must be less than 255 characters");
    }
}

fn check_priority(result: &mut ValidationResult, priority: &str) {
    if !PRIORITIES.contains(&priority) {
        result.add_error("priority", "Priority must be one of: low, medium, high");
    }
}

// ============================================================================
// Task Validators
// ============================================================================

pub struct TaskValidator;

impl Validator<CreateTaskRequest> for TaskValidator {
    fn validate(&self, data: &CreateTaskRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        check_name(&mut result, &data.name);
        check_priority(&mut result, &data.priority);
        result
    }
}

impl Validator<UpdateTaskRequest> for TaskValidator {
    fn validate(&self, data: &UpdateTaskRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        if let Some(name) = &data.name {
            check_name(&mut result, name);
        }
        if let Some(priority) = &data.priority {
            check_priority(&mut result, priority);
        }
        result
    }
}

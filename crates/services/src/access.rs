//! The capability gate shared by every course-scoped flow.

use elearn_core::model::{Actor, CourseId};
use storage::repository::EnrollmentRepository;

use crate::error::AccessError;

/// Allow the action if the actor is enrolled in the course or bypasses the
/// enrollment check (admin).
///
/// Consumed identically by lesson completion, quiz taking, and the course
/// views so the gating rule lives in exactly one place.
///
/// # Errors
///
/// Returns `AccessError::NotEnrolled` when a non-admin has no enrollment
/// row, and storage errors unchanged.
pub async fn ensure_course_access(
    actor: &Actor,
    course_id: CourseId,
    enrollments: &dyn EnrollmentRepository,
) -> Result<(), AccessError> {
    if actor.bypasses_enrollment() {
        return Ok(());
    }
    match enrollments.get_enrollment(actor.id(), course_id).await? {
        Some(_) => Ok(()),
        None => Err(AccessError::NotEnrolled),
    }
}

/// Allow the action only for actors with the authoring capability.
///
/// # Errors
///
/// Returns `AccessError::AdminOnly` for everyone else.
pub fn ensure_author(actor: &Actor) -> Result<(), AccessError> {
    if actor.can_author() {
        Ok(())
    } else {
        Err(AccessError::AdminOnly)
    }
}

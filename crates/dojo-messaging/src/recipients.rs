//! Recipient resolution: "who can I message". Read-only; enumerates the
//! contacts an actor may address given their role and branch context.

use dojo_db::Database;
use dojo_db::models::ContactRow;
use dojo_types::models::{Actor, Recipient, Role};

use crate::error::{MessagingError, Result};

/// A student's resolved branch set: the direct assignment when present,
/// otherwise the branches of their active enrollments.
pub fn student_branch_ids(db: &Database, actor: &Actor) -> Result<Vec<String>> {
    if let Some(branch_id) = &actor.branch_id {
        return Ok(vec![branch_id.clone()]);
    }
    Ok(db.enrollment_branches(&actor.id)?)
}

pub fn available_recipients(db: &Database, actor: &Actor) -> Result<Vec<Recipient>> {
    let mut recipients = Vec::new();

    match actor.role {
        Role::Student => {
            let branch_ids = student_branch_ids(db, actor)?;

            // Legacy-data accommodation: a student with no resolvable branch
            // still gets somebody to write to — every active branch manager.
            if branch_ids.is_empty() {
                for bm in db.active_branch_managers()? {
                    let branch_id = bm.branch_id.clone();
                    push_unique(&mut recipients, to_recipient(bm, Role::BranchManager, branch_id));
                }
            }

            for branch_id in &branch_ids {
                for coach in db.coaches_in_branch(branch_id)? {
                    let coach_branch = coach.branch_id.clone();
                    push_unique(&mut recipients, to_recipient(coach, Role::Coach, coach_branch));
                }
                if let Some(manager) = branch_manager_of(db, branch_id)? {
                    push_unique(
                        &mut recipients,
                        to_recipient(manager, Role::BranchManager, Some(branch_id.clone())),
                    );
                }
            }

            add_superadmins(db, &mut recipients)?;
        }

        Role::Coach => {
            // The session may lack a branch; fall back to the coach's own
            // directory record before giving up.
            let mut branch_id = actor.branch_id.clone();
            if branch_id.is_none() {
                branch_id = db.get_coach(&actor.id)?.and_then(|c| c.branch_id);
            }

            if let Some(branch_id) = branch_id {
                for student in db.students_in_branch(&branch_id)? {
                    let student_branch = student.branch_id.clone();
                    push_unique(&mut recipients, to_recipient(student, Role::Student, student_branch));
                }
                if let Some(manager) = branch_manager_of(db, &branch_id)? {
                    push_unique(
                        &mut recipients,
                        to_recipient(manager, Role::BranchManager, Some(branch_id)),
                    );
                }
            }

            add_superadmins(db, &mut recipients)?;
        }

        Role::BranchManager => {
            let branch_ids: Vec<String> = db
                .branches_managed_by(&actor.id)?
                .into_iter()
                .map(|b| b.id)
                .collect();

            let enrollments = db.active_enrollments_in_branches(&branch_ids)?;
            let mut student_ids: Vec<String> = Vec::new();
            for e in &enrollments {
                if !student_ids.contains(&e.student_id) {
                    student_ids.push(e.student_id.clone());
                }
            }

            for student in db.students_by_ids(&student_ids)? {
                // Tag the student with the branch their enrollment came from.
                let branch_id = enrollments
                    .iter()
                    .find(|e| e.student_id == student.id)
                    .map(|e| e.branch_id.clone());
                push_unique(&mut recipients, to_recipient(student, Role::Student, branch_id));
            }

            for coach in db.coaches_in_branches(&branch_ids)? {
                let coach_branch = coach.branch_id.clone();
                push_unique(&mut recipients, to_recipient(coach, Role::Coach, coach_branch));
            }

            add_superadmins(db, &mut recipients)?;
        }

        Role::Superadmin => {
            for student in db.active_students()? {
                let branch_id = student.branch_id.clone();
                push_unique(&mut recipients, to_recipient(student, Role::Student, branch_id));
            }
            for coach in db.active_coaches()? {
                let branch_id = coach.branch_id.clone();
                push_unique(&mut recipients, to_recipient(coach, Role::Coach, branch_id));
            }
            for bm in db.active_branch_managers()? {
                let branch_id = bm.branch_id.clone();
                push_unique(&mut recipients, to_recipient(bm, Role::BranchManager, branch_id));
            }
        }
    }

    Ok(recipients)
}

/// One role slice of the recipient list, with an optional branch filter.
/// `allowed` names the caller roles the view serves; anyone else is denied
/// outright rather than handed an empty list.
pub fn recipients_of_role(
    db: &Database,
    actor: &Actor,
    want: Role,
    allowed: &[Role],
    branch_id: Option<&str>,
) -> Result<Vec<Recipient>> {
    if !allowed.contains(&actor.role) {
        return Err(MessagingError::not_reachable(
            "This view is not available for your role",
        ));
    }

    Ok(available_recipients(db, actor)?
        .into_iter()
        .filter(|r| r.role == want)
        .filter(|r| match branch_id {
            Some(branch_id) => r.branch_id.as_deref() == Some(branch_id),
            None => true,
        })
        .collect())
}

fn branch_manager_of(db: &Database, branch_id: &str) -> Result<Option<ContactRow>> {
    let Some(branch) = db.get_branch(branch_id)? else {
        return Ok(None);
    };
    let Some(manager_id) = branch.manager_id else {
        return Ok(None);
    };
    Ok(db.get_branch_manager(&manager_id)?)
}

fn add_superadmins(db: &Database, recipients: &mut Vec<Recipient>) -> Result<()> {
    for admin in db.active_superadmins()? {
        push_unique(recipients, to_recipient(admin, Role::Superadmin, None));
    }
    Ok(())
}

fn to_recipient(row: ContactRow, role: Role, branch_id: Option<String>) -> Recipient {
    Recipient {
        id: row.id,
        name: row.full_name,
        email: row.email,
        role,
        branch_id,
    }
}

fn push_unique(recipients: &mut Vec<Recipient>, candidate: Recipient) {
    if !recipients.iter().any(|r| r.id == candidate.id) {
        recipients.push(candidate);
    }
}

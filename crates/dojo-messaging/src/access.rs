//! Write-path authorization: may this sender message this specific person?
//! The matrix is asymmetric — direction matters — and replies get extra
//! leniency in exactly one cell (coach replying to a student).

use dojo_db::Database;
use dojo_db::models::ContactRow;
use dojo_types::models::{Actor, Participant, Role};

use crate::error::{MessagingError, Result};
use crate::recipients::student_branch_ids;

/// Look up the target and check the (sender role, target role) cell of the
/// permission matrix. Returns the validated recipient snapshot.
pub fn validate_recipient(
    db: &Database,
    actor: &Actor,
    recipient_id: &str,
    recipient_type: Role,
    is_reply: bool,
) -> Result<Participant> {
    let target = lookup(db, recipient_id, recipient_type)?
        .ok_or(MessagingError::NotFound("recipient"))?;

    match (actor.role, recipient_type) {
        (Role::Superadmin, _) => {}
        (_, Role::Superadmin) => {}

        (Role::Student, Role::Student) => {
            return Err(MessagingError::not_reachable(
                "Students cannot message other students",
            ));
        }
        (Role::Coach, Role::Coach) => {
            return Err(MessagingError::not_reachable(
                "Coaches cannot message other coaches",
            ));
        }
        (Role::BranchManager, Role::BranchManager) => {
            return Err(MessagingError::not_reachable(
                "Branch managers cannot message other branch managers",
            ));
        }

        (Role::Student, Role::Coach) => {
            let branches = student_branch_ids(db, actor)?;
            let reachable = target
                .branch_id
                .as_ref()
                .is_some_and(|b| branches.contains(b));
            if !reachable {
                return Err(MessagingError::not_reachable(
                    "Cannot message coaches from other branches",
                ));
            }
        }

        (Role::Student, Role::BranchManager) => {
            if !manages_any(db, recipient_id, &student_branch_ids(db, actor)?)? {
                return Err(MessagingError::not_reachable(
                    "Cannot message this branch manager",
                ));
            }
        }

        (Role::Coach, Role::Student) => {
            coach_may_reach_student(db, actor, &target, is_reply)?;
        }

        (Role::Coach, Role::BranchManager) => {
            // A coach with no branch anywhere is legacy data; let it through.
            if let Some(branch_id) = coach_effective_branch(db, actor)? {
                let manager = db.get_branch(&branch_id)?.and_then(|b| b.manager_id);
                if manager.as_deref() != Some(recipient_id) {
                    return Err(MessagingError::not_reachable(
                        "Cannot message this branch manager",
                    ));
                }
            }
        }

        (Role::BranchManager, Role::Student) | (Role::BranchManager, Role::Coach) => {
            let managed: Vec<String> = db
                .branches_managed_by(&actor.id)?
                .into_iter()
                .map(|b| b.id)
                .collect();
            let reachable = target
                .branch_id
                .as_ref()
                .is_some_and(|b| managed.contains(b));
            if !reachable {
                return Err(MessagingError::not_reachable(
                    "Cannot message users from branches you don't manage",
                ));
            }
        }
    }

    Ok(Participant {
        user_id: target.id,
        user_type: recipient_type,
        user_name: target.full_name,
        user_email: target.email,
        branch_id: target.branch_id,
    })
}

/// The most intricate rule in the system, preserved exactly. New messages
/// require an exact branch match. Replies pass when either side lacks a
/// branch or the branches match; on a mismatch, a pre-existing thread
/// between the two is the deciding fallback — conversation continuity wins
/// over tenant isolation there, pending product review.
fn coach_may_reach_student(
    db: &Database,
    actor: &Actor,
    target: &ContactRow,
    is_reply: bool,
) -> Result<()> {
    let coach_branch = coach_effective_branch(db, actor)?;

    if is_reply {
        let branches_compatible = coach_branch.is_none()
            || target.branch_id.is_none()
            || coach_branch == target.branch_id;
        if branches_compatible || db.any_thread_between(&actor.id, &target.id)? {
            return Ok(());
        }
        return Err(MessagingError::not_reachable(
            "Cannot reply to students from other branches",
        ));
    }

    match coach_branch {
        Some(branch_id) => {
            if target.branch_id.as_deref() != Some(branch_id.as_str()) {
                return Err(MessagingError::not_reachable(
                    "Cannot message students from other branches",
                ));
            }
            Ok(())
        }
        // No branch on the session or the coach record: legacy data, allow.
        None => Ok(()),
    }
}

/// Session branch if present, else the coach's own directory record.
fn coach_effective_branch(db: &Database, actor: &Actor) -> Result<Option<String>> {
    if actor.branch_id.is_some() {
        return Ok(actor.branch_id.clone());
    }
    Ok(db.get_coach(&actor.id)?.and_then(|c| c.branch_id))
}

fn manages_any(db: &Database, manager_id: &str, branch_ids: &[String]) -> Result<bool> {
    for branch_id in branch_ids {
        if let Some(branch) = db.get_branch(branch_id)? {
            if branch.manager_id.as_deref() == Some(manager_id) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn lookup(db: &Database, id: &str, role: Role) -> Result<Option<ContactRow>> {
    let row = match role {
        Role::Student => db.get_student(id)?,
        Role::Coach => db.get_coach(id)?,
        Role::BranchManager => db.get_branch_manager(id)?,
        Role::Superadmin => db.get_superadmin(id)?,
    };
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Denial;
    use dojo_db::models::ThreadRow;
    use dojo_db::queries::participant_pair;

    fn fixture() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.insert_branch("b1", "North", Some("m1"), true).unwrap();
        db.insert_branch("b2", "South", Some("m2"), true).unwrap();
        db.insert_branch_manager("m1", "Mara North", "m1@dojo.test", Some("b1"), true)
            .unwrap();
        db.insert_branch_manager("m2", "Sefa South", "m2@dojo.test", Some("b2"), true)
            .unwrap();
        db.insert_coach("c1", "Coach One", "c1@dojo.test", Some("b1"), true)
            .unwrap();
        db.insert_coach("c2", "Coach Two", "c2@dojo.test", Some("b2"), true)
            .unwrap();
        db.insert_coach("c3", "Coach Three", "c3@dojo.test", None, true)
            .unwrap();
        db.insert_student("s1", "Student One", "s1@dojo.test", Some("b1"), true)
            .unwrap();
        db.insert_student("s2", "Student Two", "s2@dojo.test", None, true)
            .unwrap();
        db.insert_enrollment("e1", "s2", "b2", true).unwrap();
        db.insert_superadmin("sa", "Head Office", "sa@dojo.test", true)
            .unwrap();
        db
    }

    fn actor(id: &str, role: Role, branch_id: Option<&str>) -> Actor {
        Actor {
            id: id.to_string(),
            role,
            name: format!("actor {id}"),
            email: format!("{id}@dojo.test"),
            branch_id: branch_id.map(str::to_string),
        }
    }

    fn seed_thread(db: &Database, a: &str, b: &str) {
        let (low, high) = participant_pair(a, b);
        let now = chrono::Utc::now().to_rfc3339();
        let row = ThreadRow {
            id: format!("t-{low}-{high}"),
            subject: "Old conversation".into(),
            participant_low: low.to_string(),
            participant_high: high.to_string(),
            participants: "[]".into(),
            message_count: 0,
            last_message_id: None,
            last_message_at: None,
            last_sender_id: None,
            is_active: true,
            is_archived: false,
            allowed_branches: "[]".into(),
            created_at: now.clone(),
            updated_at: now,
        };
        assert!(db.try_insert_thread(&row).unwrap());
    }

    fn assert_not_reachable(result: Result<Participant>) {
        match result {
            Err(MessagingError::Forbidden(Denial::NotReachable(_))) => {}
            other => panic!("expected reachability denial, got {other:?}"),
        }
    }

    #[test]
    fn same_role_is_always_denied() {
        let db = fixture();
        let student = actor("s1", Role::Student, Some("b1"));
        db.insert_student("s9", "Other Student", "s9@dojo.test", Some("b1"), true)
            .unwrap();
        assert_not_reachable(validate_recipient(&db, &student, "s9", Role::Student, false));

        let coach = actor("c1", Role::Coach, Some("b1"));
        assert_not_reachable(validate_recipient(&db, &coach, "c2", Role::Coach, false));

        let manager = actor("m1", Role::BranchManager, Some("b1"));
        assert_not_reachable(validate_recipient(&db, &manager, "m2", Role::BranchManager, false));
    }

    #[test]
    fn student_reaches_coach_only_in_own_branches() {
        let db = fixture();
        let s1 = actor("s1", Role::Student, Some("b1"));
        assert!(validate_recipient(&db, &s1, "c1", Role::Coach, false).is_ok());
        assert_not_reachable(validate_recipient(&db, &s1, "c2", Role::Coach, false));

        // s2 has no direct branch; the enrollment in b2 supplies it.
        let s2 = actor("s2", Role::Student, None);
        assert!(validate_recipient(&db, &s2, "c2", Role::Coach, false).is_ok());
        assert_not_reachable(validate_recipient(&db, &s2, "c1", Role::Coach, false));
    }

    #[test]
    fn student_reaches_only_their_branch_manager() {
        let db = fixture();
        let s1 = actor("s1", Role::Student, Some("b1"));
        assert!(validate_recipient(&db, &s1, "m1", Role::BranchManager, false).is_ok());
        assert_not_reachable(validate_recipient(&db, &s1, "m2", Role::BranchManager, false));
    }

    #[test]
    fn coach_new_message_requires_exact_branch_match() {
        let db = fixture();
        let c2 = actor("c2", Role::Coach, Some("b2"));
        assert_not_reachable(validate_recipient(&db, &c2, "s1", Role::Student, false));

        let c1 = actor("c1", Role::Coach, Some("b1"));
        assert!(validate_recipient(&db, &c1, "s1", Role::Student, false).is_ok());

        // Session without a branch falls back to the coach record.
        let c1_bare = actor("c1", Role::Coach, None);
        assert!(validate_recipient(&db, &c1_bare, "s1", Role::Student, false).is_ok());
    }

    #[test]
    fn coach_reply_mismatch_needs_existing_thread() {
        let db = fixture();
        let c2 = actor("c2", Role::Coach, Some("b2"));

        // Branch mismatch, no shared history: denied even as a reply.
        assert_not_reachable(validate_recipient(&db, &c2, "s1", Role::Student, true));

        // The same reply goes through once a thread between them exists.
        seed_thread(&db, "c2", "s1");
        assert!(validate_recipient(&db, &c2, "s1", Role::Student, true).is_ok());

        // A brand-new message still fails despite the history.
        assert_not_reachable(validate_recipient(&db, &c2, "s1", Role::Student, false));
    }

    #[test]
    fn coach_reply_lenient_when_either_side_lacks_branch() {
        let db = fixture();
        // Student s2 has no branch on their record.
        let c1 = actor("c1", Role::Coach, Some("b1"));
        assert!(validate_recipient(&db, &c1, "s2", Role::Student, true).is_ok());
        // Coach c3 has no branch anywhere.
        let c3 = actor("c3", Role::Coach, None);
        assert!(validate_recipient(&db, &c3, "s1", Role::Student, true).is_ok());
    }

    #[test]
    fn coach_reaches_own_manager_only() {
        let db = fixture();
        let c1 = actor("c1", Role::Coach, Some("b1"));
        assert!(validate_recipient(&db, &c1, "m1", Role::BranchManager, false).is_ok());
        assert_not_reachable(validate_recipient(&db, &c1, "m2", Role::BranchManager, false));

        // Coach with no branch at all: legacy accommodation allows it.
        let c3 = actor("c3", Role::Coach, None);
        assert!(validate_recipient(&db, &c3, "m2", Role::BranchManager, false).is_ok());
    }

    #[test]
    fn branch_manager_scope_is_managed_branches() {
        let db = fixture();
        let m1 = actor("m1", Role::BranchManager, Some("b1"));
        assert!(validate_recipient(&db, &m1, "s1", Role::Student, false).is_ok());
        assert!(validate_recipient(&db, &m1, "c1", Role::Coach, false).is_ok());
        assert_not_reachable(validate_recipient(&db, &m1, "c2", Role::Coach, false));
        // s2's record carries no branch, so the manager cannot reach them.
        assert_not_reachable(validate_recipient(&db, &m1, "s2", Role::Student, false));
    }

    #[test]
    fn superadmin_reaches_anyone_and_everyone_reaches_superadmin() {
        let db = fixture();
        let sa = actor("sa", Role::Superadmin, None);
        for (id, role) in [
            ("s1", Role::Student),
            ("c2", Role::Coach),
            ("m1", Role::BranchManager),
        ] {
            assert!(validate_recipient(&db, &sa, id, role, false).is_ok());
        }
        for (id, role, branch) in [
            ("s1", Role::Student, Some("b1")),
            ("c1", Role::Coach, Some("b1")),
            ("m2", Role::BranchManager, Some("b2")),
        ] {
            let sender = actor(id, role, branch);
            assert!(validate_recipient(&db, &sender, "sa", Role::Superadmin, false).is_ok());
        }
    }

    #[test]
    fn unknown_or_inactive_recipient_is_not_found() {
        let db = fixture();
        db.insert_coach("c4", "Gone Coach", "c4@dojo.test", Some("b1"), false)
            .unwrap();
        let s1 = actor("s1", Role::Student, Some("b1"));
        for id in ["missing", "c4"] {
            match validate_recipient(&db, &s1, id, Role::Coach, false) {
                Err(MessagingError::NotFound("recipient")) => {}
                other => panic!("expected not-found, got {other:?}"),
            }
        }
    }
}

//! Identity directory lookups. The rows here are owned by the wider academy
//! system (enrollment, staff management, admin CRUD); the messaging core
//! treats them as read-only. The insert helpers exist for that outer system
//! and for test fixtures.

use crate::Database;
use crate::models::{BranchRow, ContactRow, EnrollmentRow};
use crate::queries::OptionalExt;
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Students --

    pub fn get_student(&self, id: &str) -> Result<Option<ContactRow>> {
        self.with_conn(|conn| query_contact(conn, "students", id))
    }

    pub fn active_students(&self) -> Result<Vec<ContactRow>> {
        self.with_conn(|conn| query_contacts(conn, "students"))
    }

    pub fn students_in_branch(&self, branch_id: &str) -> Result<Vec<ContactRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, full_name, email, branch_id FROM students
                 WHERE branch_id = ?1 AND is_active = 1",
            )?;
            collect_contacts(&mut stmt, [branch_id])
        })
    }

    pub fn students_by_ids(&self, ids: &[String]) -> Result<Vec<ContactRow>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT id, full_name, email, branch_id FROM students
                 WHERE is_active = 1 AND id IN ({})",
                placeholders.join(", ")
            );
            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> =
                ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();
            collect_contacts(&mut stmt, params.as_slice())
        })
    }

    // -- Coaches --

    pub fn get_coach(&self, id: &str) -> Result<Option<ContactRow>> {
        self.with_conn(|conn| query_contact(conn, "coaches", id))
    }

    pub fn active_coaches(&self) -> Result<Vec<ContactRow>> {
        self.with_conn(|conn| query_contacts(conn, "coaches"))
    }

    pub fn coaches_in_branch(&self, branch_id: &str) -> Result<Vec<ContactRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, full_name, email, branch_id FROM coaches
                 WHERE branch_id = ?1 AND is_active = 1",
            )?;
            collect_contacts(&mut stmt, [branch_id])
        })
    }

    pub fn coaches_in_branches(&self, branch_ids: &[String]) -> Result<Vec<ContactRow>> {
        if branch_ids.is_empty() {
            return Ok(vec![]);
        }
        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=branch_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT id, full_name, email, branch_id FROM coaches
                 WHERE is_active = 1 AND branch_id IN ({})",
                placeholders.join(", ")
            );
            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = branch_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();
            collect_contacts(&mut stmt, params.as_slice())
        })
    }

    // -- Branch managers / superadmins --

    pub fn get_branch_manager(&self, id: &str) -> Result<Option<ContactRow>> {
        self.with_conn(|conn| query_contact(conn, "branch_managers", id))
    }

    pub fn active_branch_managers(&self) -> Result<Vec<ContactRow>> {
        self.with_conn(|conn| query_contacts(conn, "branch_managers"))
    }

    pub fn get_superadmin(&self, id: &str) -> Result<Option<ContactRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, full_name, email FROM superadmins
                     WHERE id = ?1 AND is_active = 1",
                    [id],
                    |row| {
                        Ok(ContactRow {
                            id: row.get(0)?,
                            full_name: row.get(1)?,
                            email: row.get(2)?,
                            branch_id: None,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn active_superadmins(&self) -> Result<Vec<ContactRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, full_name, email FROM superadmins WHERE is_active = 1")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(ContactRow {
                        id: row.get(0)?,
                        full_name: row.get(1)?,
                        email: row.get(2)?,
                        branch_id: None,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Branches / enrollments --

    pub fn get_branch(&self, id: &str) -> Result<Option<BranchRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, manager_id FROM branches WHERE id = ?1",
                    [id],
                    |row| {
                        Ok(BranchRow {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            manager_id: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn branches_managed_by(&self, manager_id: &str) -> Result<Vec<BranchRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, manager_id FROM branches
                 WHERE manager_id = ?1 AND is_active = 1",
            )?;
            let rows = stmt
                .query_map([manager_id], |row| {
                    Ok(BranchRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        manager_id: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Distinct branch ids from a student's active enrollments.
    pub fn enrollment_branches(&self, student_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT branch_id FROM enrollments
                 WHERE student_id = ?1 AND is_active = 1",
            )?;
            let rows = stmt
                .query_map([student_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn active_enrollments_in_branches(
        &self,
        branch_ids: &[String],
    ) -> Result<Vec<EnrollmentRow>> {
        if branch_ids.is_empty() {
            return Ok(vec![]);
        }
        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=branch_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT student_id, branch_id FROM enrollments
                 WHERE is_active = 1 AND branch_id IN ({})",
                placeholders.join(", ")
            );
            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = branch_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();
            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(EnrollmentRow {
                        student_id: row.get(0)?,
                        branch_id: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Writers for the enclosing academy system and test fixtures --

    pub fn insert_student(
        &self,
        id: &str,
        full_name: &str,
        email: &str,
        branch_id: Option<&str>,
        is_active: bool,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO students (id, full_name, email, branch_id, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, full_name, email, branch_id, is_active],
            )?;
            Ok(())
        })
    }

    pub fn insert_coach(
        &self,
        id: &str,
        full_name: &str,
        email: &str,
        branch_id: Option<&str>,
        is_active: bool,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO coaches (id, full_name, email, branch_id, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, full_name, email, branch_id, is_active],
            )?;
            Ok(())
        })
    }

    pub fn insert_branch_manager(
        &self,
        id: &str,
        full_name: &str,
        email: &str,
        branch_id: Option<&str>,
        is_active: bool,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO branch_managers (id, full_name, email, branch_id, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, full_name, email, branch_id, is_active],
            )?;
            Ok(())
        })
    }

    pub fn insert_superadmin(
        &self,
        id: &str,
        full_name: &str,
        email: &str,
        is_active: bool,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO superadmins (id, full_name, email, is_active)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, full_name, email, is_active],
            )?;
            Ok(())
        })
    }

    pub fn insert_branch(
        &self,
        id: &str,
        name: &str,
        manager_id: Option<&str>,
        is_active: bool,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO branches (id, name, manager_id, is_active)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, name, manager_id, is_active],
            )?;
            Ok(())
        })
    }

    pub fn insert_enrollment(
        &self,
        id: &str,
        student_id: &str,
        branch_id: &str,
        is_active: bool,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO enrollments (id, student_id, branch_id, is_active)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, student_id, branch_id, is_active],
            )?;
            Ok(())
        })
    }
}

// The three staff/student tables share a column layout; the table name is
// always a literal from this module, never caller input.
fn query_contact(conn: &Connection, table: &str, id: &str) -> Result<Option<ContactRow>> {
    let sql = format!(
        "SELECT id, full_name, email, branch_id FROM {table}
         WHERE id = ?1 AND is_active = 1"
    );
    let row = conn
        .query_row(&sql, [id], |row| {
            Ok(ContactRow {
                id: row.get(0)?,
                full_name: row.get(1)?,
                email: row.get(2)?,
                branch_id: row.get(3)?,
            })
        })
        .optional()?;
    Ok(row)
}

fn query_contacts(conn: &Connection, table: &str) -> Result<Vec<ContactRow>> {
    let sql = format!("SELECT id, full_name, email, branch_id FROM {table} WHERE is_active = 1");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ContactRow {
                id: row.get(0)?,
                full_name: row.get(1)?,
                email: row.get(2)?,
                branch_id: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn collect_contacts<P: rusqlite::Params>(
    stmt: &mut rusqlite::Statement<'_>,
    params: P,
) -> Result<Vec<ContactRow>> {
    let rows = stmt
        .query_map(params, |row| {
            Ok(ContactRow {
                id: row.get(0)?,
                full_name: row.get(1)?,
                email: row.get(2)?,
                branch_id: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

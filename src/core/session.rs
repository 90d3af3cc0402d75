//! Employee sessions.
//!
//! The till works on behalf of one signed-in employee. Instead of a global
//! "current employee", a [`Session`] is opened once by the shell and handed to every
//! workflow that needs to know who is acting.

use crate::{
    entities::{Employee as EmployeeEntity, employee},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::{fmt, str::FromStr};
use tracing::{info, instrument, warn};

/// Staff role, deciding which parts of the till an employee may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Full access
    Admin,
    /// Oversees staff and reports, does not ring up sales
    Supervisor,
    /// Manages inventory, does not ring up sales
    Warehouse,
    /// Rings up sales
    Cashier,
}

impl Role {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Supervisor => "supervisor",
            Self::Warehouse => "warehouse",
            Self::Cashier => "cashier",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Self::Admin),
            "supervisor" => Ok(Self::Supervisor),
            "warehouse" => Ok(Self::Warehouse),
            "cashier" => Ok(Self::Cashier),
            other => Err(Error::InvalidRecord {
                message: format!("unknown employee role '{other}'"),
            }),
        }
    }
}

/// The employee a session acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    /// Employee id, recorded as the seller of each sale
    pub id: i64,
    /// Full name
    pub name: String,
    /// Role
    pub role: Role,
}

impl TryFrom<employee::Model> for Employee {
    type Error = Error;

    fn try_from(model: employee::Model) -> Result<Self> {
        Ok(Self {
            role: model.role.parse()?,
            id: model.id,
            name: model.name,
        })
    }
}

/// Context owned by the shell and passed to each workflow call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    employee: Employee,
}

impl Session {
    /// Wraps an already-authenticated employee.
    #[must_use]
    pub const fn new(employee: Employee) -> Self {
        Self { employee }
    }

    /// The signed-in employee
    #[must_use]
    pub const fn employee(&self) -> &Employee {
        &self.employee
    }

    /// Whether this employee may ring up sales.
    #[must_use]
    pub const fn can_sell(&self) -> bool {
        matches!(self.employee.role, Role::Admin | Role::Cashier)
    }

    /// Whether this employee may receive, withdraw or adjust stock.
    #[must_use]
    pub const fn can_manage_inventory(&self) -> bool {
        matches!(self.employee.role, Role::Admin | Role::Warehouse)
    }
}

/// Registers a new active employee.
///
/// # Errors
/// Returns an error if the name or email is blank, or the insert fails
/// (for example on a duplicate email).
pub async fn create_employee(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    role: Role,
) -> Result<employee::Model> {
    if name.trim().is_empty() || email.trim().is_empty() {
        return Err(Error::Config {
            message: "Employee name and email cannot be empty".to_string(),
        });
    }

    let model = employee::ActiveModel {
        name: Set(name.trim().to_string()),
        email: Set(email.trim().to_lowercase()),
        role: Set(role.as_str().to_string()),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Changes an employee's name and/or role. `None` leaves a field as it is.
///
/// # Errors
/// Returns `Error::EmployeeNotFound` if the employee does not exist, `Error::Config`
/// for a blank name, or an error if the update fails.
#[instrument(skip(db))]
pub async fn update_employee(
    db: &DatabaseConnection,
    employee_id: i64,
    name: Option<&str>,
    role: Option<Role>,
) -> Result<employee::Model> {
    let mut model: employee::ActiveModel = EmployeeEntity::find_by_id(employee_id)
        .one(db)
        .await?
        .ok_or(Error::EmployeeNotFound { id: employee_id })?
        .into();

    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err(Error::Config {
                message: "Employee name cannot be empty".to_string(),
            });
        }
        model.name = Set(name.trim().to_string());
    }
    if let Some(role) = role {
        model.role = Set(role.as_str().to_string());
    }

    let updated = model.update(db).await?;
    info!("Employee {} updated ({})", updated.id, updated.role);
    Ok(updated)
}

/// Activates or deactivates an employee. Inactive employees cannot open a session.
///
/// # Errors
/// Returns `Error::EmployeeNotFound` if the employee does not exist, or an error if
/// the update fails.
#[instrument(skip(db))]
pub async fn set_employee_active(
    db: &DatabaseConnection,
    employee_id: i64,
    active: bool,
) -> Result<employee::Model> {
    let mut model: employee::ActiveModel = EmployeeEntity::find_by_id(employee_id)
        .one(db)
        .await?
        .ok_or(Error::EmployeeNotFound { id: employee_id })?
        .into();

    model.is_active = Set(active);
    let updated = model.update(db).await?;
    info!(
        "Employee {} is now {}",
        updated.id,
        if active { "active" } else { "inactive" }
    );
    Ok(updated)
}

/// Lists employees ordered by name, optionally filtered by role and active flag.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_employees(
    db: &DatabaseConnection,
    role: Option<Role>,
    active: Option<bool>,
) -> Result<Vec<employee::Model>> {
    let mut query = EmployeeEntity::find().order_by_asc(employee::Column::Name);
    if let Some(role) = role {
        query = query.filter(employee::Column::Role.eq(role.as_str()));
    }
    if let Some(active) = active {
        query = query.filter(employee::Column::IsActive.eq(active));
    }
    query.all(db).await.map_err(Into::into)
}

/// Opens a session for an active employee.
///
/// # Errors
/// Returns `Error::EmployeeNotFound` if the employee does not exist or is inactive,
/// and `Error::InvalidRecord` if the stored role is unknown.
#[instrument(skip(db))]
pub async fn open_session(db: &DatabaseConnection, employee_id: i64) -> Result<Session> {
    let Some(model) = EmployeeEntity::find_by_id(employee_id)
        .one(db)
        .await?
        .filter(|e| e.is_active)
    else {
        warn!("Session refused for unknown or inactive employee {}", employee_id);
        return Err(Error::EmployeeNotFound { id: employee_id });
    };

    let employee = Employee::try_from(model)?;
    info!("Session opened for {} ({})", employee.name, employee.role);
    Ok(Session::new(employee))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_only_admins_and_cashiers_sell() {
        let session = |role| {
            Session::new(Employee {
                id: 1,
                name: "Ana".to_string(),
                role,
            })
        };
        assert!(session(Role::Admin).can_sell());
        assert!(session(Role::Cashier).can_sell());
        assert!(!session(Role::Supervisor).can_sell());
        assert!(!session(Role::Warehouse).can_sell());

        assert!(session(Role::Admin).can_manage_inventory());
        assert!(session(Role::Warehouse).can_manage_inventory());
        assert!(!session(Role::Cashier).can_manage_inventory());
        assert!(!session(Role::Supervisor).can_manage_inventory());
    }

    #[tokio::test]
    async fn test_open_session_for_active_employee() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_employee(&db, " Ana Torres ", "Ana@Example.com", Role::Cashier).await?;
        assert_eq!(created.email, "ana@example.com");

        let session = open_session(&db, created.id).await?;
        assert_eq!(session.employee().id, created.id);
        assert_eq!(session.employee().name, "Ana Torres");
        assert_eq!(session.employee().role, Role::Cashier);

        Ok(())
    }

    #[tokio::test]
    async fn test_open_session_refuses_inactive_and_unknown() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_employee(&db, "Luis", "luis@example.com", Role::Admin).await?;

        let inactive = set_employee_active(&db, created.id, false).await?;
        assert!(!inactive.is_active);

        assert!(matches!(
            open_session(&db, created.id).await,
            Err(Error::EmployeeNotFound { .. })
        ));
        assert!(matches!(
            open_session(&db, 999).await,
            Err(Error::EmployeeNotFound { id: 999 })
        ));

        // Reactivation lets the employee back in
        set_employee_active(&db, created.id, true).await?;
        assert_eq!(open_session(&db, created.id).await?.employee().name, "Luis");

        Ok(())
    }

    #[tokio::test]
    async fn test_update_employee_name_and_role() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_employee(&db, "Rosa", "rosa@example.com", Role::Cashier).await?;

        let updated = update_employee(&db, created.id, None, Some(Role::Warehouse)).await?;
        assert_eq!(updated.name, "Rosa");
        assert_eq!(updated.role, "warehouse");

        let updated = update_employee(&db, created.id, Some(" Rosa Diaz "), None).await?;
        assert_eq!(updated.name, "Rosa Diaz");
        assert_eq!(updated.role, "warehouse");

        let session = open_session(&db, created.id).await?;
        assert!(!session.can_sell());
        assert!(session.can_manage_inventory());

        assert!(matches!(
            update_employee(&db, created.id, Some("  "), None).await,
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            update_employee(&db, 999, None, Some(Role::Admin)).await,
            Err(Error::EmployeeNotFound { id: 999 })
        ));
        assert!(matches!(
            set_employee_active(&db, 999, true).await,
            Err(Error::EmployeeNotFound { id: 999 })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_employees_filters() -> Result<()> {
        let db = setup_test_db().await?;
        create_employee(&db, "Carla", "carla@example.com", Role::Cashier).await?;
        let beto = create_employee(&db, "Beto", "beto@example.com", Role::Cashier).await?;
        create_employee(&db, "Ana", "ana@example.com", Role::Admin).await?;
        set_employee_active(&db, beto.id, false).await?;

        let all = list_employees(&db, None, None).await?;
        let names: Vec<_> = all.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Ana", "Beto", "Carla"]);

        let cashiers = list_employees(&db, Some(Role::Cashier), None).await?;
        assert_eq!(cashiers.len(), 2);

        let active_cashiers = list_employees(&db, Some(Role::Cashier), Some(true)).await?;
        assert_eq!(active_cashiers.len(), 1);
        assert_eq!(active_cashiers[0].name, "Carla");

        let inactive = list_employees(&db, None, Some(false)).await?;
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].id, beto.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_employee_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_employee(&db, "  ", "x@example.com", Role::Cashier).await;
        assert!(matches!(result, Err(Error::Config { .. })));
        Ok(())
    }
}

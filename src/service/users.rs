use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::auth::password::{hash_password, verify_password};
use crate::config::BootstrapAccount;
use crate::error::{AppError, AppResult};
use crate::model::{
    leave::LeaveSeed,
    role::Role,
    user::{NewUser, User, UserFilter, UserPatch, normalize_email},
};
use crate::service::Page;
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    pub employee_code: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub hire_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub employee_code: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

fn validate_email(email: &str) -> AppResult<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !email.contains(' '),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AppError::validation(format!("Invalid email address: {email}")))
    }
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn hash(password: &str) -> AppResult<String> {
    hash_password(password).map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Creates the account and its seeded leave ledger.
#[instrument(skip(state, seed, input), fields(email = %input.email, role = %input.role))]
pub async fn create_user(state: &AppState, seed: LeaveSeed, input: CreateUser) -> AppResult<User> {
    let email = normalize_email(&input.email);
    validate_email(&email)?;
    validate_password(&input.password)?;
    let full_name = input.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(AppError::validation("full_name must not be empty"));
    }

    if state.emails.is_taken(&email).await {
        debug!("Email rejected by index");
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let user = state
        .store
        .insert_user(
            NewUser {
                email,
                password_hash: hash(&input.password)?,
                full_name,
                role: input.role,
                employee_code: input.employee_code,
                phone: input.phone,
                department: input.department,
                position: input.position,
                hire_date: input.hire_date,
            },
            seed,
        )
        .await?;

    state.emails.mark_taken(&user.email).await;
    info!(user_id = user.id, "User created");
    Ok(user)
}

/// Resolves login credentials; every failure looks the same to the caller.
#[instrument(skip(state, password))]
pub async fn authenticate(state: &AppState, email: &str, password: &str) -> AppResult<User> {
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let Some(credentials) = state.store.find_credentials(&normalize_email(email)).await? else {
        info!("Invalid credentials: user not found");
        return Err(invalid());
    };

    if let Err(e) = verify_password(password, &credentials.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(invalid());
    }

    if !credentials.user.is_active {
        info!(user_id = credentials.user.id, "Login refused: account inactive");
        return Err(AppError::Unauthorized("Account is inactive".to_string()));
    }

    Ok(credentials.user)
}

pub async fn get_user(state: &AppState, id: u64) -> AppResult<User> {
    state
        .store
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

pub async fn list_users(
    state: &AppState,
    role: Option<Role>,
    page: Page,
) -> AppResult<(Vec<User>, i64)> {
    let filter = UserFilter {
        role,
        page: page.page,
        per_page: page.per_page,
    };
    Ok(state.store.list_users(&filter).await?)
}

#[instrument(skip(state, input))]
pub async fn update_user(state: &AppState, id: u64, input: UpdateUser) -> AppResult<User> {
    let email = match input.email.as_deref() {
        Some(raw) => {
            let email = normalize_email(raw);
            validate_email(&email)?;
            Some(email)
        }
        None => None,
    };
    let password_hash = match input.password.as_deref() {
        Some(password) => {
            validate_password(password)?;
            Some(hash(password)?)
        }
        None => None,
    };
    if input.full_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::validation("full_name must not be empty"));
    }

    let patch = UserPatch {
        email,
        password_hash,
        full_name: input.full_name.map(|n| n.trim().to_string()),
        role: input.role,
        employee_code: input.employee_code,
        phone: input.phone,
        department: input.department,
        position: input.position,
        hire_date: input.hire_date,
        is_active: input.is_active,
    };
    if patch.is_empty() {
        return Err(AppError::validation("No fields provided for update"));
    }

    let previous = get_user(state, id).await?;
    let updated = state
        .store
        .update_user(id, &patch)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if updated.email != previous.email {
        state.emails.forget(&previous.email).await;
        state.emails.mark_taken(&updated.email).await;
    }
    info!(user_id = id, "User updated");
    Ok(updated)
}

/// Removes a user and everything that belongs to them.
#[instrument(skip(state))]
pub async fn delete_user(state: &AppState, actor_id: u64, id: u64) -> AppResult<()> {
    if actor_id == id {
        return Err(AppError::validation("You cannot delete your own account"));
    }

    let user = get_user(state, id).await?;
    if !state.store.delete_user(id).await? {
        return Err(AppError::not_found("User not found"));
    }

    state.emails.forget(&user.email).await;
    info!(user_id = id, "User deleted");
    Ok(())
}

/// Creates the configured HR account when no HR user exists yet.
pub async fn ensure_bootstrap_hr(
    state: &AppState,
    seed: LeaveSeed,
    account: &BootstrapAccount,
) -> AppResult<Option<User>> {
    if !state.store.users_with_role(Role::Hr).await?.is_empty() {
        debug!("HR account present, bootstrap skipped");
        return Ok(None);
    }

    let user = create_user(
        state,
        seed,
        CreateUser {
            email: account.email.clone(),
            password: account.password.clone(),
            full_name: "HR Administrator".to_string(),
            role: Role::Hr,
            employee_code: None,
            phone: None,
            department: Some("Human Resources".to_string()),
            position: None,
            hire_date: None,
        },
    )
    .await?;
    info!(user_id = user.id, "Bootstrap HR account created");
    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::{state_on, user};
    use crate::store::{LeaveStore, UserStore};

    fn create(email: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            password: "changeme123".to_string(),
            full_name: "Jane Doe".to_string(),
            role: Role::Employee,
            employee_code: Some("EMP001".to_string()),
            phone: None,
            department: None,
            position: None,
            hire_date: None,
        }
    }

    #[actix_web::test]
    async fn creation_seeds_the_ledger_and_normalises_email() {
        let (state, store) = state_on("2024-06-01");

        let created = create_user(&state, LeaveSeed::default(), create(" Jane@Example.COM "))
            .await
            .unwrap();

        assert_eq!(created.email, "jane@example.com");
        let ledger = store.leave_balance(created.id).await.unwrap().unwrap();
        assert_eq!(ledger.annual_leave, 10.0);
        assert_eq!(ledger.sick_leave, 5.0);
        assert_eq!(ledger.casual_leave, 5.0);
    }

    #[actix_web::test]
    async fn duplicate_email_and_code_conflict() {
        let (state, _) = state_on("2024-06-01");
        create_user(&state, LeaveSeed::default(), create("jane@example.com"))
            .await
            .unwrap();

        let same_email = create_user(&state, LeaveSeed::default(), create("JANE@example.com")).await;
        assert!(matches!(same_email, Err(AppError::Conflict(_))));

        let same_code = create_user(&state, LeaveSeed::default(), create("john@example.com")).await;
        assert!(matches!(same_code, Err(AppError::Conflict(_))));
    }

    #[actix_web::test]
    async fn weak_input_is_rejected() {
        let (state, _) = state_on("2024-06-01");
        let mut short = create("jane@example.com");
        short.password = "short".into();
        assert!(matches!(
            create_user(&state, LeaveSeed::default(), short).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            create_user(&state, LeaveSeed::default(), create("not-an-email")).await,
            Err(AppError::Validation(_))
        ));
    }

    #[actix_web::test]
    async fn authenticate_checks_password_and_activity() {
        let (state, _) = state_on("2024-06-01");
        let jane = user(&state, Role::Employee, "jane@example.com").await;

        assert_eq!(
            authenticate(&state, "JANE@example.com", "changeme123").await.unwrap().id,
            jane.id
        );
        assert!(matches!(
            authenticate(&state, "jane@example.com", "wrong-password").await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            authenticate(&state, "nobody@example.com", "changeme123").await,
            Err(AppError::Unauthorized(_))
        ));

        update_user(
            &state,
            jane.id,
            UpdateUser {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(matches!(
            authenticate(&state, "jane@example.com", "changeme123").await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[actix_web::test]
    async fn email_change_moves_the_index_entry() {
        let (state, _) = state_on("2024-06-01");
        let jane = user(&state, Role::Employee, "jane@example.com").await;

        update_user(
            &state,
            jane.id,
            UpdateUser {
                email: Some("jane.doe@example.com".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(!state.emails.is_taken("jane@example.com").await);
        assert!(state.emails.is_taken("jane.doe@example.com").await);
    }

    #[actix_web::test]
    async fn empty_update_is_rejected() {
        let (state, _) = state_on("2024-06-01");
        let jane = user(&state, Role::Employee, "jane@example.com").await;
        assert!(matches!(
            update_user(&state, jane.id, UpdateUser::default()).await,
            Err(AppError::Validation(_))
        ));
    }

    #[actix_web::test]
    async fn delete_removes_user_but_not_self() {
        let (state, store) = state_on("2024-06-01");
        let hr = user(&state, Role::Hr, "hr@example.com").await;
        let jane = user(&state, Role::Employee, "jane@example.com").await;

        assert!(matches!(
            delete_user(&state, hr.id, hr.id).await,
            Err(AppError::Validation(_))
        ));

        delete_user(&state, hr.id, jane.id).await.unwrap();
        assert!(store.find_user(jane.id).await.unwrap().is_none());
        assert!(matches!(
            delete_user(&state, hr.id, jane.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn bootstrap_runs_once() {
        let (state, _) = state_on("2024-06-01");
        let account = BootstrapAccount {
            email: "admin@example.com".into(),
            password: "changeme123".into(),
        };

        let first = ensure_bootstrap_hr(&state, LeaveSeed::default(), &account)
            .await
            .unwrap();
        assert_eq!(first.map(|u| u.role), Some(Role::Hr));

        let second = ensure_bootstrap_hr(&state, LeaveSeed::default(), &account)
            .await
            .unwrap();
        assert!(second.is_none());
    }
}

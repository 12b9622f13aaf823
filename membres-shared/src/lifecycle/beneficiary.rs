/// Beneficiary initialization
///
/// A beneficiary cannot exist without a user account. Before a beneficiary
/// is inserted, its user is completed (username generated from the names,
/// random password when none was given, first-password marker) and both
/// rows are written in the caller's transaction.
///
/// # Example
///
/// ```no_run
/// use membres_shared::lifecycle::{create_membership, BeneficiaryDraft};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let draft = BeneficiaryDraft {
///     membership_id: None,
///     firstname: "Jean".to_string(),
///     lastname: "Dupont".to_string(),
///     email: "jean.dupont@example.com".to_string(),
///     phone: None,
///     address: None,
///     flying: false,
///     user: None,
/// };
///
/// let (membership, main) = create_membership(&pool, None, draft).await?;
/// println!("#{} {}", membership.member_number, main.user.username);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use super::first_password::mark_password_to_set;
use super::username::{base_username, resolve_username};
use crate::auth::password::{generate_password, hash_password, PasswordError};
use crate::auth::roles::Role;
use crate::models::beneficiary::{Address, Beneficiary, CreateBeneficiary};
use crate::models::membership::{CreateMembership, Membership};
use crate::models::user::{CreateUser, User};

/// Error type for lifecycle hooks
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// The linked user already exists; beneficiaries are only initialized
    /// together with a new account
    #[error("User {0} already exists")]
    UserAlreadyPersisted(Uuid),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// User account attached to a beneficiary that is not written yet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserDraft {
    /// Set once the user is persisted
    pub id: Option<Uuid>,

    pub username: Option<String>,

    /// Plaintext, hashed at initialization
    pub password: Option<String>,

    pub roles: Vec<Role>,
}

/// Beneficiary about to be created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeneficiaryDraft {
    pub membership_id: Option<Uuid>,
    pub firstname: String,
    pub lastname: String,

    /// Stored on the linked user
    pub email: String,

    pub phone: Option<String>,
    pub address: Option<Address>,
    pub flying: bool,
    pub user: Option<UserDraft>,
}

/// Result of [`initialize_beneficiary`]
#[derive(Debug, Clone)]
pub struct InitializedBeneficiary {
    pub beneficiary: Beneficiary,
    pub user: User,

    /// Plaintext of the password drawn for the account, if one was drawn
    pub generated_password: Option<String>,
}

/// Completes the linked user of `draft` and inserts both rows on `conn`
///
/// Run it inside a transaction: a failure after the user insert must not
/// leave an account without its beneficiary.
pub async fn initialize_beneficiary(
    conn: &mut PgConnection,
    mut draft: BeneficiaryDraft,
) -> Result<InitializedBeneficiary, LifecycleError> {
    let user = draft.user.get_or_insert_with(UserDraft::default);
    if let Some(id) = user.id {
        return Err(LifecycleError::UserAlreadyPersisted(id));
    }

    if user.username.is_none() {
        let base = base_username(&draft.firstname, &draft.lastname);
        let existing = User::usernames_starting_with(&mut *conn, &base).await?;
        user.username = Some(resolve_username(&base, &existing));
    }

    let mut generated_password = None;
    if user.password.is_none() {
        let password = generate_password();
        generated_password = Some(password.clone());
        user.password = Some(password);
    }

    if !user.roles.contains(&Role::User) {
        user.roles.insert(0, Role::User);
    }

    mark_password_to_set(&mut draft);

    let BeneficiaryDraft {
        membership_id,
        firstname,
        lastname,
        email,
        phone,
        address,
        flying,
        user,
    } = draft;
    let UserDraft {
        username,
        password,
        roles,
        ..
    } = user.unwrap_or_default();

    let password_hash = hash_password(password.as_deref().unwrap_or_default())?;
    let user = User::create(
        &mut *conn,
        CreateUser {
            username: username.unwrap_or_default(),
            email,
            password_hash,
            roles,
        },
    )
    .await?;

    let beneficiary = Beneficiary::create(
        &mut *conn,
        CreateBeneficiary {
            user_id: user.id,
            membership_id,
            firstname,
            lastname,
            phone,
            address: address.filter(|a| !a.is_empty()),
            flying,
        },
    )
    .await?;

    info!(
        beneficiary_id = %beneficiary.id,
        user_id = %user.id,
        username = %user.username,
        "Beneficiary initialized"
    );

    Ok(InitializedBeneficiary {
        beneficiary,
        user,
        generated_password,
    })
}

/// Creates a membership with its main beneficiary in one transaction
///
/// `member_number` defaults to the next free number.
pub async fn create_membership(
    pool: &PgPool,
    member_number: Option<i32>,
    mut main: BeneficiaryDraft,
) -> Result<(Membership, InitializedBeneficiary), LifecycleError> {
    let mut tx = pool.begin().await?;

    let member_number = match member_number {
        Some(number) => number,
        None => Membership::next_member_number(&mut *tx).await?,
    };
    let membership = Membership::create(&mut *tx, CreateMembership { member_number }).await?;

    main.membership_id = Some(membership.id);
    let initialized = initialize_beneficiary(&mut *tx, main).await?;

    Membership::set_main_beneficiary(&mut *tx, membership.id, initialized.beneficiary.id).await?;

    tx.commit().await?;

    let membership = Membership {
        main_beneficiary_id: Some(initialized.beneficiary.id),
        ..membership
    };

    Ok((membership, initialized))
}

/// Hooks run around the persistence of beneficiaries and users
///
/// - [`beneficiary`]: every beneficiary gets a user account, created in the
///   same transaction
/// - [`username`]: username generation from first and last names
/// - [`first_password`]: the `ROLE_PASSWORD_TO_SET` marker and the redirect
///   it triggers

pub mod beneficiary;
pub mod first_password;
pub mod username;

pub use beneficiary::{
    create_membership, initialize_beneficiary, BeneficiaryDraft, InitializedBeneficiary,
    LifecycleError, UserDraft,
};

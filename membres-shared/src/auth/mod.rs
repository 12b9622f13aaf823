/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing, generation and validation
/// - [`jwt`]: access and refresh tokens
/// - [`roles`]: security roles and their hierarchy
/// - [`context`]: the authenticated actor of a request
/// - [`voters`]: per-entity access decisions
///
/// # Example
///
/// ```no_run
/// use membres_shared::auth::password::{hash_password, verify_password};
/// use membres_shared::auth::jwt::{create_token, validate_access_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Passw0rdLong")?;
/// assert!(verify_password("Passw0rdLong", &hash)?);
///
/// let secret = "a-secret-of-at-least-thirty-two-bytes!";
/// let claims = Claims::new(Uuid::new_v4(), "JeanDupont", TokenType::Access);
/// let token = create_token(&claims, secret)?;
/// let decoded = validate_access_token(&token, secret)?;
/// assert_eq!(decoded.username, "JeanDupont");
/// # Ok(())
/// # }
/// ```

pub mod context;
pub mod jwt;
pub mod password;
pub mod roles;
pub mod voters;

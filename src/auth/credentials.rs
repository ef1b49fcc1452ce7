//! Credential management for Earth Engine access
//!
//! This module handles storage, retrieval, and validation of the Google Cloud
//! project id and OAuth2 access token. Credentials are stored in a .env file
//! with owner-only permissions.

use std::env;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::app::{ClientConfig, EarthEngineClient};
use crate::constants::{auth, env as env_constants};
use crate::errors::{AuthError, AuthResult};

const DOTENV_FILE: &str = ".env";

/// Authentication status information
#[derive(Debug, Clone)]
pub struct AuthStatus {
    /// Whether the project id environment variable is set
    pub project_id_set: bool,
    /// Whether the access token environment variable is set
    pub access_token_set: bool,
    /// Whether .env file exists in current directory
    pub dotenv_file_exists: bool,
    /// Whether credentials have been verified (None = not tested)
    pub credentials_valid: Option<bool>,
}

impl AuthStatus {
    /// Build a status from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F, dotenv_file_exists: bool) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_set = |name: &str| lookup(name).is_some_and(|v| !v.trim().is_empty());
        Self {
            project_id_set: is_set(env_constants::PROJECT_ID),
            access_token_set: is_set(env_constants::ACCESS_TOKEN),
            dotenv_file_exists,
            credentials_valid: None,
        }
    }

    /// Check if both credentials are available
    pub fn has_credentials(&self) -> bool {
        self.project_id_set && self.access_token_set
    }

    /// Get descriptive status message for display
    pub fn status_message(&self) -> String {
        match (self.has_credentials(), self.credentials_valid) {
            (false, _) => "Missing credentials - run 'auth setup' to configure".to_string(),
            (true, None) => "Credentials configured but not verified".to_string(),
            (true, Some(true)) => "Credentials configured and verified".to_string(),
            (true, Some(false)) => {
                "Credentials configured but rejected (access tokens expire after about an hour)"
                    .to_string()
            }
        }
    }
}

/// Check current authentication status
pub fn get_auth_status() -> AuthStatus {
    AuthStatus::from_lookup(|name| env::var(name).ok(), Path::new(DOTENV_FILE).exists())
}

/// Check if credentials exist in environment variables
pub fn check_credentials() -> bool {
    get_auth_status().has_credentials()
}

/// Validate a Google Cloud project id
///
/// Project ids are 6 to 30 characters of lowercase letters, digits, and
/// hyphens. They start with a letter and do not end with a hyphen.
pub fn validate_project_id(project_id: &str) -> AuthResult<()> {
    let invalid = |reason: &str| {
        Err(AuthError::InvalidProjectId {
            reason: reason.to_string(),
        })
    };

    if project_id.len() < auth::MIN_PROJECT_ID_LENGTH
        || project_id.len() > auth::MAX_PROJECT_ID_LENGTH
    {
        return invalid(&format!(
            "must be {} to {} characters long",
            auth::MIN_PROJECT_ID_LENGTH,
            auth::MAX_PROJECT_ID_LENGTH
        ));
    }

    if !project_id.starts_with(|c: char| c.is_ascii_lowercase()) {
        return invalid("must start with a lowercase letter");
    }

    if project_id.ends_with('-') {
        return invalid("cannot end with a hyphen");
    }

    if !project_id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return invalid("may only contain lowercase letters, digits, and hyphens");
    }

    Ok(())
}

/// Prompt user for credentials interactively
pub fn prompt_credentials() -> AuthResult<(String, String)> {
    print!("Google Cloud project id: ");
    io::stdout().flush().map_err(AuthError::CredentialStorage)?;

    let mut project_id = String::new();
    io::stdin()
        .read_line(&mut project_id)
        .map_err(AuthError::CredentialStorage)?;
    let project_id = project_id.trim().to_string();

    validate_project_id(&project_id)?;

    println!("Paste an access token (e.g. output of `gcloud auth print-access-token`).");
    let token = rpassword::prompt_password("Access token: ")
        .map_err(|e| AuthError::CredentialStorage(io::Error::new(io::ErrorKind::Other, e)))?;
    let token = token.trim().to_string();

    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    Ok((project_id, token))
}

/// Merge credentials into the dotenv file at `env_path`
///
/// Existing lines for other variables are preserved; the file is left
/// readable by its owner only.
pub fn write_env_file(env_path: &Path, project_id: &str, access_token: &str) -> AuthResult<()> {
    let mut lines = read_env_lines(env_path)?;
    lines.retain(|line| !is_credential_line(line));
    lines.push(format!("{}={}", env_constants::PROJECT_ID, project_id));
    lines.push(format!("{}={}", env_constants::ACCESS_TOKEN, access_token));

    write_env_lines(env_path, &lines)
}

/// Remove stored credentials from the dotenv file at `env_path`
///
/// Returns whether anything was removed.
pub fn remove_from_env_file(env_path: &Path) -> AuthResult<bool> {
    if !env_path.exists() {
        return Ok(false);
    }

    let mut lines = read_env_lines(env_path)?;
    let before = lines.len();
    lines.retain(|line| !is_credential_line(line));

    if lines.len() == before {
        return Ok(false);
    }

    if lines.iter().all(|l| l.trim().is_empty()) {
        fs::remove_file(env_path)?;
    } else {
        write_env_lines(env_path, &lines)?;
    }
    Ok(true)
}

fn is_credential_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    [env_constants::PROJECT_ID, env_constants::ACCESS_TOKEN]
        .iter()
        .any(|name| trimmed.starts_with(&format!("{}=", name)))
}

fn read_env_lines(env_path: &Path) -> AuthResult<Vec<String>> {
    if !env_path.exists() {
        return Ok(Vec::new());
    }
    Ok(fs::read_to_string(env_path)?
        .lines()
        .map(str::to_string)
        .collect())
}

fn write_env_lines(env_path: &Path, lines: &[String]) -> AuthResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(env_path)?;

    for line in lines {
        writeln!(file, "{}", line)?;
    }

    // Set restrictive permissions (Unix-like systems only)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = file.metadata()?.permissions();
        perms.set_mode(auth::ENV_FILE_PERMISSIONS);
        file.set_permissions(perms)?;
    }

    Ok(())
}

/// Save credentials to .env and the current process environment
pub fn save_credentials(project_id: &str, access_token: &str) -> AuthResult<()> {
    write_env_file(Path::new(DOTENV_FILE), project_id, access_token)?;

    env::set_var(env_constants::PROJECT_ID, project_id);
    env::set_var(env_constants::ACCESS_TOKEN, access_token);

    println!("Credentials saved to .env file");

    #[cfg(unix)]
    println!("File permissions set to owner-only (600)");

    #[cfg(not(unix))]
    println!(
        "Warning: File permissions not set (non-Unix system). Please ensure .env file is protected."
    );

    Ok(())
}

/// Remove credentials from .env and the current process environment
pub fn clear_credentials() -> AuthResult<()> {
    let removed = remove_from_env_file(Path::new(DOTENV_FILE))?;

    env::remove_var(env_constants::PROJECT_ID);
    env::remove_var(env_constants::ACCESS_TOKEN);

    if removed {
        println!("Removed credentials from .env file");
    } else {
        println!("No stored credentials found in .env");
    }
    Ok(())
}

/// Verify credentials by opening an Earth Engine session
///
/// Returns `Ok(false)` when the service rejects them; missing credentials
/// are an error.
pub async fn verify_credentials(config: ClientConfig, probe_collection: &str) -> AuthResult<bool> {
    if !check_credentials() {
        return Err(AuthError::MissingCredentials);
    }

    println!("Verifying credentials with Earth Engine...");

    match EarthEngineClient::from_env(config, probe_collection).await {
        Ok(client) => {
            println!("Credentials verified for project {}", client.project_id());
            Ok(true)
        }
        Err(e) => {
            println!("Credential verification failed: {}", e);
            Ok(false)
        }
    }
}

/// Interactive credential setup workflow
pub async fn setup_credentials(config: ClientConfig, probe_collection: &str) -> AuthResult<()> {
    println!("Earth Engine Authentication Setup");
    println!("=================================");
    println!();
    println!("Requests are billed to a Google Cloud project registered for Earth Engine.");
    println!("The project id and an access token will be stored in a .env file in the current directory.");
    println!();

    // Check if credentials already exist
    if check_credentials() {
        println!("Warning: Credentials are already configured.");
        print!("Do you want to update them? [y/N]: ");
        io::stdout().flush().map_err(AuthError::CredentialStorage)?;

        let mut response = String::new();
        io::stdin()
            .read_line(&mut response)
            .map_err(AuthError::CredentialStorage)?;

        if !response.trim().to_lowercase().starts_with('y') {
            println!("Setup cancelled.");
            return Ok(());
        }
        println!();
    }

    let (project_id, access_token) = prompt_credentials()?;

    println!();
    println!("Saving credentials...");
    save_credentials(&project_id, &access_token)?;

    println!();
    if verify_credentials(config, probe_collection).await? {
        println!();
        println!("Setup complete! You can now run 'fetch'.");
    } else {
        println!();
        println!("Setup failed. Please check your project id and token and try again.");
        println!("   You can run 'auth setup' again to re-enter your credentials.");
    }

    Ok(())
}

/// Show current authentication status
pub async fn show_auth_status(config: ClientConfig, probe_collection: &str) -> AuthResult<()> {
    let mut status = get_auth_status();

    println!("Earth Engine Authentication Status");
    println!("==================================");
    println!();

    match env::var(env_constants::PROJECT_ID) {
        Ok(project_id) => println!("Project id: {} (set)", project_id),
        Err(_) => println!("Project id: Not set"),
    }

    println!(
        "Access token: {}",
        if status.access_token_set {
            "Set"
        } else {
            "Not set"
        }
    );

    println!(
        ".env file: {}",
        if status.dotenv_file_exists {
            "Exists"
        } else {
            "Not found"
        }
    );

    println!();

    if status.has_credentials() {
        let is_valid = verify_credentials(config, probe_collection).await?;
        status.credentials_valid = Some(is_valid);
        println!();
    }

    println!("Status: {}", status.status_message());

    if !status.has_credentials() {
        println!();
        println!("To configure credentials, run: imagery_fetcher auth setup");
    } else if status.credentials_valid == Some(false) {
        println!();
        println!("To update credentials, run: imagery_fetcher auth setup");
    }

    Ok(())
}

/// Offer interactive setup when a command needs credentials that are missing
pub async fn ensure_authenticated(config: ClientConfig, probe_collection: &str) -> AuthResult<()> {
    if check_credentials() {
        return Ok(());
    }

    println!("This command requires Earth Engine credentials.");
    println!();

    print!("Would you like to set up authentication now? [Y/n]: ");
    io::stdout().flush().map_err(AuthError::CredentialStorage)?;

    let mut response = String::new();
    io::stdin()
        .read_line(&mut response)
        .map_err(AuthError::CredentialStorage)?;

    if response.trim().to_lowercase().starts_with('n') {
        return Err(AuthError::MissingCredentials);
    }

    println!();
    setup_credentials(config, probe_collection).await?;

    if !check_credentials() {
        return Err(AuthError::MissingCredentials);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_valid_project_id() {
        // Valid cases
        assert!(validate_project_id("my-project").is_ok());
        assert!(validate_project_id("ee-survey-2024").is_ok());
        assert!(validate_project_id("abcdef").is_ok());
        assert!(validate_project_id(&format!("a{}", "b".repeat(29))).is_ok());

        // Invalid cases
        assert!(validate_project_id("").is_err()); // empty
        assert!(validate_project_id("abc").is_err()); // too short
        assert!(validate_project_id(&"a".repeat(31)).is_err()); // too long
        assert!(validate_project_id("1project").is_err()); // digit first
        assert!(validate_project_id("My-Project").is_err()); // uppercase
        assert!(validate_project_id("my_project").is_err()); // underscore
        assert!(validate_project_id("my-project-").is_err()); // trailing hyphen
    }

    #[test]
    fn test_project_id_error_reason() {
        match validate_project_id("my-project-") {
            Err(AuthError::InvalidProjectId { reason }) => assert!(reason.contains("hyphen")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_auth_status_from_lookup() {
        let mut vars = HashMap::new();
        vars.insert(env_constants::PROJECT_ID.to_string(), "my-project".to_string());

        let status = AuthStatus::from_lookup(|name| vars.get(name).cloned(), false);
        assert!(status.project_id_set);
        assert!(!status.access_token_set);
        assert!(!status.has_credentials());

        vars.insert(env_constants::ACCESS_TOKEN.to_string(), "ya29.token".to_string());
        let status = AuthStatus::from_lookup(|name| vars.get(name).cloned(), true);
        assert!(status.has_credentials());
        assert!(status.dotenv_file_exists);

        // Blank values do not count
        vars.insert(env_constants::ACCESS_TOKEN.to_string(), "  ".to_string());
        let status = AuthStatus::from_lookup(|name| vars.get(name).cloned(), true);
        assert!(!status.has_credentials());
    }

    #[test]
    fn test_auth_status_messages() {
        let mut status = AuthStatus {
            project_id_set: false,
            access_token_set: false,
            dotenv_file_exists: false,
            credentials_valid: None,
        };

        // No credentials
        assert!(status.status_message().contains("Missing credentials"));

        // Credentials set but not verified
        status.project_id_set = true;
        status.access_token_set = true;
        assert!(status.status_message().contains("not verified"));

        // Credentials verified
        status.credentials_valid = Some(true);
        assert!(status.status_message().contains("verified"));

        // Credentials rejected
        status.credentials_valid = Some(false);
        assert!(status.status_message().contains("rejected"));
    }

    #[test]
    fn test_write_env_file_new_file() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let env_path = temp_dir.path().join(".env");

        write_env_file(&env_path, "my-project", "ya29.secret")?;

        let contents = std::fs::read_to_string(&env_path)?;
        assert!(contents.contains("GOOGLE_PROJECT_ID=my-project"));
        assert!(contents.contains("EE_ACCESS_TOKEN=ya29.secret"));

        // Check permissions (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::metadata(&env_path)?.permissions();
            assert_eq!(permissions.mode() & 0o777, 0o600);
        }

        Ok(())
    }

    #[test]
    fn test_write_env_file_replaces_and_preserves() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let env_path = temp_dir.path().join(".env");
        std::fs::write(
            &env_path,
            "RUST_LOG=debug\nGOOGLE_PROJECT_ID=old-project\nEE_ACCESS_TOKEN=old\n",
        )?;

        write_env_file(&env_path, "new-project", "new-token")?;

        let contents = std::fs::read_to_string(&env_path)?;
        assert!(contents.contains("RUST_LOG=debug"));
        assert!(contents.contains("GOOGLE_PROJECT_ID=new-project"));
        assert!(!contents.contains("old-project"));
        assert_eq!(contents.matches("EE_ACCESS_TOKEN=").count(), 1);

        Ok(())
    }

    #[test]
    fn test_remove_from_env_file() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let env_path = temp_dir.path().join(".env");

        assert!(!remove_from_env_file(&env_path)?);

        std::fs::write(
            &env_path,
            "RUST_LOG=info\nGOOGLE_PROJECT_ID=my-project\nEE_ACCESS_TOKEN=token\n",
        )?;
        assert!(remove_from_env_file(&env_path)?);
        assert_eq!(std::fs::read_to_string(&env_path)?, "RUST_LOG=info\n");

        // Only credentials: the file goes away entirely
        std::fs::write(&env_path, "GOOGLE_PROJECT_ID=my-project\nEE_ACCESS_TOKEN=token\n")?;
        assert!(remove_from_env_file(&env_path)?);
        assert!(!env_path.exists());

        Ok(())
    }
}

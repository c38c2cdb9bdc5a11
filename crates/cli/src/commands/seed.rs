//! Seed the database with demo marketplace data.
//!
//! This command reads users, ideas, upvotes, and comments from a YAML file
//! and inserts them through the same code paths the site uses (Argon2id
//! password hashing included), so seeded accounts can log in normally.
//!
//! Re-running the command skips users that already exist but inserts ideas
//! again; it is meant for a fresh development database.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;

use secrecy::SecretString;
use serde::Deserialize;
use tracing::{error, info};

use idea_hub_core::{Email, IdeaId, OwnershipMode, Role};
use idea_hub_web::db::{self, IdeaRepository, NewIdea, UserRepository};
use idea_hub_web::models::User;
use idea_hub_web::services::{AuthError, AuthService};

/// Top-level shape of the seed file.
#[derive(Debug, Deserialize)]
struct SeedConfig {
    #[serde(default)]
    users: Vec<SeedUser>,
    #[serde(default)]
    ideas: Vec<SeedIdea>,
}

/// A demo account.
#[derive(Debug, Deserialize)]
struct SeedUser {
    email: String,
    username: String,
    password: String,
    role: Option<String>,
    bio: Option<String>,
}

/// A demo idea, keyed to its creator by email.
#[derive(Debug, Deserialize)]
struct SeedIdea {
    creator: String,
    title: String,
    description: String,
    #[serde(default)]
    tags: Vec<String>,
    ownership: Option<String>,
    #[serde(default)]
    blurred: bool,
    /// Title of an earlier idea in this file that this one remixes.
    remix_of: Option<String>,
    #[serde(default)]
    upvoted_by: Vec<String>,
    #[serde(default)]
    comments: Vec<SeedComment>,
}

/// A demo comment, keyed to its author by email.
#[derive(Debug, Deserialize)]
struct SeedComment {
    author: String,
    text: String,
}

/// Seed demo data from a YAML file.
///
/// # Arguments
///
/// * `file_path` - Path to the YAML seed file
///
/// # Errors
///
/// Returns an error if environment variables are missing, the file cannot be
/// read or fails validation, or database operations fail.
pub async fn demo_data(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| "DATABASE_URL not set")?;

    // Verify file exists
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading seed data from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let config: SeedConfig = serde_yaml::from_str(&content)?;

    info!(
        users = config.users.len(),
        ideas = config.ideas.len(),
        "Parsed seed file"
    );

    let errors = validate(&config);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    // Connect to database
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let auth = AuthService::new(&pool);
    let users_repo = UserRepository::new(&pool);
    let ideas_repo = IdeaRepository::new(&pool);

    // Seed users through the auth service so passwords hash normally
    let mut users_created = 0_usize;
    let mut users_skipped = 0_usize;
    let mut users_by_email: HashMap<String, User> = HashMap::new();

    for spec in &config.users {
        let user = match auth
            .register(&spec.email, &spec.username, &spec.password)
            .await
        {
            Ok(user) => {
                users_created += 1;
                if spec.bio.is_some() {
                    users_repo
                        .update_profile(user.id, spec.bio.as_deref(), None)
                        .await?
                } else {
                    user
                }
            }
            Err(AuthError::UserAlreadyExists | AuthError::UsernameTaken) => {
                users_skipped += 1;
                let email = Email::parse(&spec.email)?;
                users_repo
                    .get_by_email(&email)
                    .await?
                    .ok_or_else(|| format!("user {} exists but could not be loaded", spec.email))?
            }
            Err(e) => return Err(e.into()),
        };

        let user = match spec.role.as_deref() {
            Some(role) if user.role.is_none() => {
                users_repo.set_role(user.id, Role::from_str(role)?).await?
            }
            _ => user,
        };

        users_by_email.insert(spec.email.clone(), user);
    }

    // Seed ideas, then their upvotes and comments
    let mut ideas_created = 0_usize;
    let mut upvotes = 0_usize;
    let mut comments = 0_usize;
    let mut ideas_by_title: HashMap<String, IdeaId> = HashMap::new();

    for spec in &config.ideas {
        let creator = users_by_email
            .get(&spec.creator)
            .ok_or_else(|| format!("unknown creator: {}", spec.creator))?;

        let ownership_mode = spec
            .ownership
            .as_deref()
            .map(OwnershipMode::from_str)
            .transpose()?
            .unwrap_or_default();

        let remix_of = spec
            .remix_of
            .as_ref()
            .map(|title| {
                ideas_by_title
                    .get(title)
                    .copied()
                    .ok_or_else(|| format!("remix source not seeded yet: {title}"))
            })
            .transpose()?;

        let idea = ideas_repo
            .create(
                creator.id,
                &NewIdea {
                    title: spec.title.clone(),
                    description: spec.description.clone(),
                    tags: spec.tags.clone(),
                    image_url: None,
                    is_blurred: spec.blurred,
                    ownership_mode,
                    remix_of,
                    mint_to_self: false,
                },
            )
            .await?;
        ideas_created += 1;
        ideas_by_title.insert(spec.title.clone(), idea.id);

        for voter in &spec.upvoted_by {
            let user = users_by_email
                .get(voter)
                .ok_or_else(|| format!("unknown upvoter: {voter}"))?;
            if ideas_repo.toggle_upvote(idea.id, user.id).await? {
                upvotes += 1;
            }
        }

        for comment in &spec.comments {
            let author = users_by_email
                .get(&comment.author)
                .ok_or_else(|| format!("unknown comment author: {}", comment.author))?;
            ideas_repo
                .add_comment(idea.id, author.id, &author.username, &comment.text)
                .await?;
            comments += 1;
        }
    }

    // Print summary
    info!("Seeding complete!");
    info!("  Users created: {users_created}");
    info!("  Users skipped (already exist): {users_skipped}");
    info!("  Ideas created: {ideas_created}");
    info!("  Upvotes: {upvotes}");
    info!("  Comments: {comments}");

    Ok(())
}

/// Check cross-references and enum values before touching the database.
fn validate(config: &SeedConfig) -> Vec<String> {
    let mut errors = Vec::new();

    let emails: HashSet<&str> = config.users.iter().map(|u| u.email.as_str()).collect();
    let mut titles: HashSet<&str> = HashSet::new();

    for user in &config.users {
        if let Some(role) = &user.role {
            if Role::from_str(role).is_err() {
                errors.push(format!("user {}: invalid role '{role}'", user.email));
            }
        }
    }

    for idea in &config.ideas {
        if !emails.contains(idea.creator.as_str()) {
            errors.push(format!("idea '{}': unknown creator {}", idea.title, idea.creator));
        }
        if let Some(mode) = &idea.ownership {
            if OwnershipMode::from_str(mode).is_err() {
                errors.push(format!("idea '{}': invalid ownership '{mode}'", idea.title));
            }
        }
        if let Some(source) = &idea.remix_of {
            // Sources must appear earlier in the file so the ID exists
            if !titles.contains(source.as_str()) {
                errors.push(format!(
                    "idea '{}': remix source '{source}' not defined earlier in file",
                    idea.title
                ));
            }
        }
        for voter in &idea.upvoted_by {
            if !emails.contains(voter.as_str()) {
                errors.push(format!("idea '{}': unknown upvoter {voter}", idea.title));
            }
        }
        for comment in &idea.comments {
            if !emails.contains(comment.author.as_str()) {
                errors.push(format!(
                    "idea '{}': unknown comment author {}",
                    idea.title, comment.author
                ));
            }
        }
        titles.insert(idea.title.as_str());
    }

    errors
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_config() -> SeedConfig {
        serde_yaml::from_str(
            r"
users:
  - email: ada@example.com
    username: ada
    password: hub-demo-pass
    role: creator
    bio: Tinkers with engines.
  - email: grace@example.com
    username: grace
    password: hub-demo-pass
    role: investor
ideas:
  - creator: ada@example.com
    title: Analytical Engine
    description: A mechanical general-purpose computer.
    tags: [hardware, compute]
    ownership: forsale
    upvoted_by: [grace@example.com]
    comments:
      - author: grace@example.com
        text: Would fund this.
  - creator: ada@example.com
    title: Analytical Engine Mk II
    description: Smaller, faster, steam-free.
    remix_of: Analytical Engine
",
        )
        .unwrap()
    }

    #[test]
    fn test_parse_seed_file() {
        let config = sample_config();
        assert_eq!(config.users.len(), 2);
        assert_eq!(config.ideas.len(), 2);
        let first = config.ideas.first().unwrap();
        assert_eq!(first.tags, vec!["hardware", "compute"]);
        assert_eq!(first.upvoted_by, vec!["grace@example.com"]);
        assert!(!first.blurred);
        let second = config.ideas.get(1).unwrap();
        assert_eq!(second.remix_of.as_deref(), Some("Analytical Engine"));
    }

    #[test]
    fn test_validate_accepts_consistent_config() {
        assert!(validate(&sample_config()).is_empty());
    }

    #[test]
    fn test_validate_catches_unknown_references() {
        let mut config = sample_config();
        config.ideas.push(SeedIdea {
            creator: "nobody@example.com".to_string(),
            title: "Orphan".to_string(),
            description: String::new(),
            tags: vec![],
            ownership: Some("rented".to_string()),
            blurred: false,
            remix_of: Some("Unseeded".to_string()),
            upvoted_by: vec!["ghost@example.com".to_string()],
            comments: vec![],
        });

        let errors = validate(&config);
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.contains("unknown creator")));
        assert!(errors.iter().any(|e| e.contains("invalid ownership")));
        assert!(errors.iter().any(|e| e.contains("remix source")));
        assert!(errors.iter().any(|e| e.contains("unknown upvoter")));
    }

    #[test]
    fn test_validate_rejects_remix_of_later_idea() {
        // Swap order so the remix comes before its source
        let mut config = sample_config();
        config.ideas.reverse();
        let errors = validate(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors.first().is_some_and(|e| e.contains("remix source")));
    }
}

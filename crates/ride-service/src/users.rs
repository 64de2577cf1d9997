//! The user directory and the signed-in user.
//!
//! Ratings are owned by an external subsystem; this layer only stores what it
//! is given at seed time.

use ride_core::{
  store::CollectionStore,
  user::{Role, User},
};
use uuid::Uuid;

use crate::{Error, Result, repository::Repository};

pub struct UserDirectory<S> {
  repo: Repository<S>,
}

impl<S> Clone for UserDirectory<S> {
  fn clone(&self) -> Self { Self { repo: self.repo.clone() } }
}

impl<S: CollectionStore> UserDirectory<S> {
  pub fn new(repo: Repository<S>) -> Self { Self { repo } }

  /// Insert the given users, skipping ids already present. Returns how many
  /// were added.
  pub async fn seed(&self, users: Vec<User>) -> Result<usize> {
    let mut directory = self.repo.users().await?;
    let before = directory.value.len();
    for user in users {
      if !directory.value.iter().any(|u| u.user_id == user.user_id) {
        directory.value.push(user);
      }
    }

    let added = directory.value.len() - before;
    if added > 0 {
      self.repo.save_users(directory.version, &directory.value).await?;
      tracing::info!(added, "seeded users");
    }
    Ok(added)
  }

  /// Sign up a new, unrated user.
  pub async fn register(&self, name: &str, role: Role) -> Result<User> {
    let name = name.trim();
    if name.is_empty() {
      return Err(ride_core::Error::MissingField("name").into());
    }

    let mut directory = self.repo.users().await?;
    let user = User::new(name, role);
    directory.value.push(user.clone());
    self.repo.save_users(directory.version, &directory.value).await?;

    tracing::info!(user_id = %user.user_id, ?role, "registered user");
    Ok(user)
  }

  pub async fn all(&self) -> Result<Vec<User>> {
    Ok(self.repo.users().await?.value)
  }

  pub async fn get(&self, user_id: Uuid) -> Result<User> {
    self
      .all()
      .await?
      .into_iter()
      .find(|u| u.user_id == user_id)
      .ok_or_else(|| Error::not_found("user", user_id))
  }

  pub async fn current(&self) -> Result<Option<User>> {
    Ok(self.repo.current_user().await?.value)
  }

  /// The signed-in user, or [`Error::NotSignedIn`].
  pub async fn require_current(&self) -> Result<User> {
    self.current().await?.ok_or(Error::NotSignedIn)
  }

  pub async fn sign_in(&self, user_id: Uuid) -> Result<User> {
    let user = self.get(user_id).await?;
    let session = self.repo.current_user().await?;
    self
      .repo
      .save_current_user(session.version, Some(&user))
      .await?;
    tracing::info!(%user_id, "signed in");
    Ok(user)
  }

  pub async fn sign_out(&self) -> Result<()> {
    let session = self.repo.current_user().await?;
    if session.value.is_some() {
      self.repo.save_current_user(session.version, None).await?;
    }
    Ok(())
  }
}

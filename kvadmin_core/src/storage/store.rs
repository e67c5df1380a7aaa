use std::{fs, io, path::PathBuf};

use directories::ProjectDirs;
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Error as SerdeError;

use crate::models::{Connection, User};

const TOKEN_FILE: &str = "token";
const USER_FILE: &str = "user";
const CONNECTIONS_FILE: &str = "connections";

/// Durable client-side state: the session token, the cached user profile,
/// and the list of connections that were open when the client last ran.
///
/// One JSON file per entry under the user's config dir
/// (`~/.config/kvadmin/state` on Linux, `%APPDATA%\kvadmin\state` on
/// Windows, etc.). Token and user are always written as a pair when a
/// session is established and cleared as a pair when it is torn down.
#[derive(Debug, Clone)]
pub struct ClientStore {
    dir: PathBuf,
}

impl ClientStore {
    pub fn new() -> io::Result<Self> {
        let proj = ProjectDirs::from("", "", "kvadmin")
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "Unable to locate config dir"))?;
        Self::with_dir(proj.config_dir().join("state"))
    }

    /// Store rooted at an explicit directory; tests point this at a tempdir.
    pub fn with_dir(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn file_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    fn write<T: Serialize>(&self, name: &str, value: &T) -> io::Result<()> {
        let file = fs::File::create(self.file_for(name))?;
        serde_json::to_writer_pretty(file, value).map_err(SerdeError::into)
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> io::Result<Option<T>> {
        let file = match fs::File::open(self.file_for(name)) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        serde_json::from_reader(file).map(Some).map_err(SerdeError::into)
    }

    fn remove(&self, name: &str) -> io::Result<()> {
        match fs::remove_file(self.file_for(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Persists token and user together; a session is only ever stored whole.
    pub fn save_session(&self, token: &str, user: &User) -> io::Result<()> {
        self.write(TOKEN_FILE, &token)?;
        self.write(USER_FILE, user)
    }

    pub fn save_user(&self, user: &User) -> io::Result<()> {
        self.write(USER_FILE, user)
    }

    pub fn load_token(&self) -> io::Result<Option<String>> {
        self.read(TOKEN_FILE)
    }

    /// Loads the cached profile. A malformed cache is discarded and only the
    /// user file is removed; a broken cached profile says nothing about the
    /// validity of the token.
    pub fn load_user(&self) -> io::Result<Option<User>> {
        match self.read(USER_FILE) {
            Ok(user) => Ok(user),
            Err(e) => {
                warn!("discarding unparsable cached user profile: {e}");
                self.remove(USER_FILE)?;
                Ok(None)
            }
        }
    }

    /// Removes token and user together.
    pub fn clear_session(&self) -> io::Result<()> {
        self.remove(TOKEN_FILE)?;
        self.remove(USER_FILE)
    }

    pub fn save_connections(&self, connections: &[Connection]) -> io::Result<()> {
        self.write(CONNECTIONS_FILE, &connections)
    }

    /// Loads the cached open-connection configs; malformed data is discarded.
    pub fn load_connections(&self) -> io::Result<Vec<Connection>> {
        match self.read(CONNECTIONS_FILE) {
            Ok(connections) => Ok(connections.unwrap_or_default()),
            Err(e) => {
                warn!("discarding unparsable cached connection list: {e}");
                self.remove(CONNECTIONS_FILE)?;
                Ok(Vec::new())
            }
        }
    }
}

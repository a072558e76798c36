//! Interface name and index resolution through sysfs.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use crate::netlink::Error;

/// Maximum interface name length (including null terminator).
pub const IFNAMSIZ: usize = 16;

const SYS_CLASS_NET: &str = "/sys/class/net";

/// Error type for interface lookups.
#[derive(Debug, thiserror::Error)]
pub enum IfError {
    #[error("interface not found: {0}")]
    NotFound(String),

    #[error("invalid interface name: {0}")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, IfError>;

impl From<IfError> for Error {
    fn from(e: IfError) -> Self {
        match e {
            IfError::NotFound(name) => Error::InterfaceNotFound { name },
            IfError::InvalidName(msg) => Error::InvalidMessage(format!("interface name: {}", msg)),
            IfError::Io(e) => Error::Io(e),
        }
    }
}

/// A network device named on the command line, resolved against sysfs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    pub index: u32,
}

/// Check that `name` could be a kernel interface name.
pub fn validate(name: &str) -> Result<()> {
    match name.len() {
        0 => return Err(IfError::InvalidName("empty name".to_string())),
        n if n >= IFNAMSIZ => {
            return Err(IfError::InvalidName(format!(
                "{:?} is longer than {} bytes",
                name,
                IFNAMSIZ - 1
            )));
        }
        _ => {}
    }

    match name.chars().find(|&c| c == '/' || c == '\0' || c.is_whitespace()) {
        Some(bad) => Err(IfError::InvalidName(format!("{:?} contains {:?}", name, bad))),
        None => Ok(()),
    }
}

/// Read `<dir>/ifindex`.
fn read_ifindex(dir: &Path) -> io::Result<Option<u32>> {
    let content = std::fs::read_to_string(dir.join("ifindex"))?;
    Ok(content.trim().parse().ok())
}

/// Name of the device with index `index`.
pub fn index_to_name(index: u32) -> Result<String> {
    if index == 0 {
        return Err(IfError::NotFound("index 0".to_string()));
    }

    std::fs::read_dir(SYS_CLASS_NET)?
        .flatten()
        .find(|entry| matches!(read_ifindex(&entry.path()), Ok(Some(i)) if i == index))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .ok_or_else(|| IfError::NotFound(format!("index {}", index)))
}

/// Index of the device called `name`.
///
/// A missing sysfs entry is `NotFound`; other read failures are `Io`.
pub fn name_to_index(name: &str) -> Result<u32> {
    validate(name)?;

    let dir = Path::new(SYS_CLASS_NET).join(name);
    match read_ifindex(&dir) {
        Ok(Some(index)) => Ok(index),
        Ok(None) => Err(IfError::NotFound(name.to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(IfError::NotFound(name.to_string())),
        Err(e) => Err(IfError::Io(e)),
    }
}

/// Resolve a `DEV` argument: all digits means an index, anything else a name.
pub fn resolve(arg: &str) -> Result<Device> {
    match arg.parse::<u32>() {
        Ok(index) => Ok(Device {
            name: index_to_name(index)?,
            index,
        }),
        Err(_) => Ok(Device {
            index: name_to_index(arg)?,
            name: arg.to_string(),
        }),
    }
}

/// Index to name lookups, remembered for the lifetime of the value.
#[derive(Debug, Default)]
pub struct NameCache {
    names: HashMap<u32, Option<String>>,
}

impl NameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of `index`, or `None` when sysfs does not know it.
    pub fn get(&mut self, index: u32) -> Option<String> {
        self.names
            .entry(index)
            .or_insert_with(|| index_to_name(index).ok())
            .clone()
    }
}

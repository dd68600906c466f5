//! The in-progress issue record accumulated across wizard steps

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Default value for `IssueDraft::update_frequency`
pub const DEFAULT_UPDATE_FREQUENCY: &str = "Major updates only";

/// Issue categories offered by the category step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Infrastructure,
    Sanitation,
    PublicSafety,
    Utilities,
    Transportation,
    Environment,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Infrastructure,
            Category::Sanitation,
            Category::PublicSafety,
            Category::Utilities,
            Category::Transportation,
            Category::Environment,
        ]
    }

    /// Label as shown in the picker and sent on the wire
    pub fn label(&self) -> &'static str {
        match self {
            Category::Infrastructure => "Infrastructure",
            Category::Sanitation => "Sanitation",
            Category::PublicSafety => "Public Safety",
            Category::Utilities => "Utilities",
            Category::Transportation => "Transportation",
            Category::Environment => "Environment",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::Infrastructure => "Roads, bridges, sidewalks, public buildings",
            Category::Sanitation => "Garbage collection, waste management, cleanliness",
            Category::PublicSafety => "Street lighting, traffic signals, security concerns",
            Category::Utilities => "Water supply, electricity, gas, telecommunications",
            Category::Transportation => "Public transit, parking, traffic management",
            Category::Environment => "Parks, trees, pollution, noise complaints",
        }
    }

    /// Parse an exact picker label
    pub fn parse(value: &str) -> Option<Category> {
        Self::all().iter().copied().find(|c| c.label() == value)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity levels offered by the severity step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Minor,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn all() -> &'static [Severity] {
        &[
            Severity::Minor,
            Severity::Medium,
            Severity::High,
            Severity::Critical,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Minor => "Minor",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Severity::Minor => "Cosmetic issues, minor inconveniences",
            Severity::Medium => "Moderate issues affecting daily use",
            Severity::High => "Significant problems requiring prompt attention",
            Severity::Critical => "Urgent safety hazards needing immediate action",
        }
    }

    pub fn parse(value: &str) -> Option<Severity> {
        Self::all().iter().copied().find(|s| s.label() == value)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a photo's bytes live until packaging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoSource {
    /// Already loaded into memory
    Bytes(Vec<u8>),
    /// Read from disk when the draft is packaged
    File(PathBuf),
}

/// A binary attachment on the draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub filename: String,
    pub mime_type: String,
    pub source: PhotoSource,
}

impl Photo {
    /// Create an in-memory photo
    pub fn from_bytes(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            source: PhotoSource::Bytes(bytes),
        }
    }

    /// Reference a photo on disk. The file is not opened until packaging.
    ///
    /// The MIME type is guessed from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("photo")
            .to_string();
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Self {
            filename,
            mime_type,
            source: PhotoSource::File(path.to_path_buf()),
        }
    }
}

/// Channels a reporter can opt into for status updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationChannel {
    Email,
    Sms,
    Push,
}

impl NotificationChannel {
    pub fn all() -> &'static [NotificationChannel] {
        &[
            NotificationChannel::Email,
            NotificationChannel::Sms,
            NotificationChannel::Push,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::Email => "email",
            NotificationChannel::Sms => "sms",
            NotificationChannel::Push => "push",
        }
    }
}

/// Per-channel notification preferences, all off by default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Notifications {
    pub email: bool,
    pub sms: bool,
    pub push: bool,
}

impl Notifications {
    pub fn get(&self, channel: NotificationChannel) -> bool {
        match channel {
            NotificationChannel::Email => self.email,
            NotificationChannel::Sms => self.sms,
            NotificationChannel::Push => self.push,
        }
    }

    pub fn set(&mut self, channel: NotificationChannel, enabled: bool) {
        match channel {
            NotificationChannel::Email => self.email = enabled,
            NotificationChannel::Sms => self.sms = enabled,
            NotificationChannel::Push => self.push = enabled,
        }
    }
}

/// Names of every draft field, used as keys for error mappings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftField {
    Title,
    Description,
    Location,
    Category,
    Photos,
    Severity,
    FullName,
    Email,
    Phone,
    Notifications,
    UpdateFrequency,
}

impl DraftField {
    /// Form name of the field
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftField::Title => "title",
            DraftField::Description => "description",
            DraftField::Location => "location",
            DraftField::Category => "category",
            DraftField::Photos => "photos",
            DraftField::Severity => "severity",
            DraftField::FullName => "fullName",
            DraftField::Email => "email",
            DraftField::Phone => "phone",
            DraftField::Notifications => "notifications",
            DraftField::UpdateFrequency => "updateFrequency",
        }
    }

    /// Name used for the field in the submission payload and server replies
    pub fn wire_name(&self) -> &'static str {
        match self {
            DraftField::FullName => "contact",
            other => other.as_str(),
        }
    }

    /// Map a server-side field name back onto the draft
    pub fn from_wire_name(name: &str) -> Option<DraftField> {
        Self::all().iter().copied().find(|f| f.wire_name() == name)
    }

    /// Parse a form name (`fullName`) or wire name (`contact`)
    pub fn parse(name: &str) -> Option<DraftField> {
        Self::all()
            .iter()
            .copied()
            .find(|f| f.as_str() == name)
            .or_else(|| Self::from_wire_name(name))
    }

    pub fn all() -> &'static [DraftField] {
        &[
            DraftField::Title,
            DraftField::Description,
            DraftField::Location,
            DraftField::Category,
            DraftField::Photos,
            DraftField::Severity,
            DraftField::FullName,
            DraftField::Email,
            DraftField::Phone,
            DraftField::Notifications,
            DraftField::UpdateFrequency,
        ]
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single edit applied to the draft by `ReportWizard::update_field`
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Title(String),
    Description(String),
    Location(String),
    Category(String),
    Photos(Vec<Photo>),
    Severity(String),
    FullName(String),
    Email(String),
    Phone(String),
    Notification(NotificationChannel, bool),
    UpdateFrequency(String),
}

impl FieldUpdate {
    /// The field this update writes
    pub fn field(&self) -> DraftField {
        match self {
            FieldUpdate::Title(_) => DraftField::Title,
            FieldUpdate::Description(_) => DraftField::Description,
            FieldUpdate::Location(_) => DraftField::Location,
            FieldUpdate::Category(_) => DraftField::Category,
            FieldUpdate::Photos(_) => DraftField::Photos,
            FieldUpdate::Severity(_) => DraftField::Severity,
            FieldUpdate::FullName(_) => DraftField::FullName,
            FieldUpdate::Email(_) => DraftField::Email,
            FieldUpdate::Phone(_) => DraftField::Phone,
            FieldUpdate::Notification(..) => DraftField::Notifications,
            FieldUpdate::UpdateFrequency(_) => DraftField::UpdateFrequency,
        }
    }

    /// Build a text update from a field name, as a form binding would.
    ///
    /// Returns `None` for fields that do not take a single text value
    /// (`photos`, `notifications`).
    pub fn from_text(field: DraftField, value: impl Into<String>) -> Option<FieldUpdate> {
        let value = value.into();
        let update = match field {
            DraftField::Title => FieldUpdate::Title(value),
            DraftField::Description => FieldUpdate::Description(value),
            DraftField::Location => FieldUpdate::Location(value),
            DraftField::Category => FieldUpdate::Category(value),
            DraftField::Severity => FieldUpdate::Severity(value),
            DraftField::FullName => FieldUpdate::FullName(value),
            DraftField::Email => FieldUpdate::Email(value),
            DraftField::Phone => FieldUpdate::Phone(value),
            DraftField::UpdateFrequency => FieldUpdate::UpdateFrequency(value),
            DraftField::Photos | DraftField::Notifications => return None,
        };
        Some(update)
    }
}

/// The issue record being assembled by the wizard
#[derive(Debug, Clone, PartialEq)]
pub struct IssueDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    /// Raw selection; validated against `Category::all()`
    pub category: String,
    pub photos: Vec<Photo>,
    /// Raw selection; validated against `Severity::all()`
    pub severity: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub notifications: Notifications,
    pub update_frequency: String,
}

impl Default for IssueDraft {
    fn default() -> Self {
        Self::with_update_frequency(DEFAULT_UPDATE_FREQUENCY)
    }
}

impl IssueDraft {
    /// Empty draft with a specific default update frequency
    pub fn with_update_frequency(update_frequency: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            location: String::new(),
            category: String::new(),
            photos: Vec::new(),
            severity: String::new(),
            full_name: String::new(),
            email: String::new(),
            phone: String::new(),
            notifications: Notifications::default(),
            update_frequency: update_frequency.into(),
        }
    }

    /// Write a single field
    pub fn apply(&mut self, update: FieldUpdate) {
        match update {
            FieldUpdate::Title(v) => self.title = v,
            FieldUpdate::Description(v) => self.description = v,
            FieldUpdate::Location(v) => self.location = v,
            FieldUpdate::Category(v) => self.category = v,
            FieldUpdate::Photos(v) => self.photos = v,
            FieldUpdate::Severity(v) => self.severity = v,
            FieldUpdate::FullName(v) => self.full_name = v,
            FieldUpdate::Email(v) => self.email = v,
            FieldUpdate::Phone(v) => self.phone = v,
            FieldUpdate::Notification(channel, enabled) => {
                self.notifications.set(channel, enabled);
            }
            FieldUpdate::UpdateFrequency(v) => self.update_frequency = v,
        }
    }

    /// Text value of a scalar field, `None` for photos and notifications
    pub fn text(&self, field: DraftField) -> Option<&str> {
        match field {
            DraftField::Title => Some(&self.title),
            DraftField::Description => Some(&self.description),
            DraftField::Location => Some(&self.location),
            DraftField::Category => Some(&self.category),
            DraftField::Severity => Some(&self.severity),
            DraftField::FullName => Some(&self.full_name),
            DraftField::Email => Some(&self.email),
            DraftField::Phone => Some(&self.phone),
            DraftField::UpdateFrequency => Some(&self.update_frequency),
            DraftField::Photos | DraftField::Notifications => None,
        }
    }
}

// ── Webhooks ──
//
// Outbound HTTP notifications the server sends when an event fires.
// Smart group membership events need the group they watch.

use serde_json::Value;
use strum::VariantArray;

use jamf_api::XmlElement;

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;
use crate::lookup::Ident;
use crate::object::{ApiObject, Creatable, Deletable, ObjectCore, Updatable, Writable};
use crate::resources::{ComputerGroup, MobileDeviceGroup, UserGroup};

/// Events a webhook can fire on, spelled as the server spells them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::VariantArray,
)]
#[strum(ascii_case_insensitive)]
pub enum WebhookEvent {
    ComputerAdded,
    ComputerCheckIn,
    ComputerInventoryCompleted,
    ComputerPatchPolicyCompleted,
    ComputerPolicyFinished,
    ComputerPushCapabilityChanged,
    DeviceAddedToDEP,
    JSSShutdown,
    JSSStartup,
    MobileDeviceCheckIn,
    MobileDeviceCommandCompleted,
    MobileDeviceEnrolled,
    MobileDevicePushSent,
    MobileDeviceUnEnrolled,
    PatchSoftwareTitleUpdated,
    PushSent,
    RestAPIOperation,
    SCEPChallenge,
    SmartGroupComputerMembershipChange,
    SmartGroupMobileDeviceMembershipChange,
    SmartGroupUserMembershipChange,
}

impl WebhookEvent {
    /// Event names, for help text and validation messages.
    pub fn names() -> Vec<String> {
        Self::VARIANTS.iter().map(ToString::to_string).collect()
    }

    pub fn watches_smart_group(self) -> bool {
        matches!(
            self,
            Self::SmartGroupComputerMembershipChange
                | Self::SmartGroupMobileDeviceMembershipChange
                | Self::SmartGroupUserMembershipChange
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentType {
    #[default]
    Json,
    Xml,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
        }
    }

    fn parse(s: &str) -> Self {
        if s.to_ascii_lowercase().contains("xml") {
            Self::Xml
        } else {
            Self::Json
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Webhook {
    core: ObjectCore,
    enabled: bool,
    url: Option<String>,
    content_type: ContentType,
    event: Option<WebhookEvent>,
    smart_group_id: Option<i64>,
    connection_timeout: Option<i64>,
    read_timeout: Option<i64>,
    username: Option<String>,
    password: Option<String>,
}

impl Webhook {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn event(&self) -> Option<WebhookEvent> {
        self.event
    }

    pub fn smart_group_id(&self) -> Option<i64> {
        self.smart_group_id
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.core.touch();
    }

    pub fn set_url(&mut self, url: &str) -> Result<()> {
        let parsed = url::Url::parse(url.trim())
            .map_err(|e| JssError::InvalidData(format!("'{url}' is not a URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(JssError::InvalidData(format!("'{url}' must be http or https")));
        }
        self.url = Some(parsed.into());
        self.core.touch();
        Ok(())
    }

    pub fn set_content_type(&mut self, content_type: ContentType) {
        self.content_type = content_type;
        self.core.touch();
    }

    /// Change the event. A non-smart-group event drops the watched group.
    pub fn set_event(&mut self, event: WebhookEvent) {
        self.event = Some(event);
        if !event.watches_smart_group() {
            self.smart_group_id = None;
        }
        self.core.touch();
    }

    /// Timeouts in seconds; `None` leaves the server default.
    pub fn set_timeouts(&mut self, connect: Option<i64>, read: Option<i64>) -> Result<()> {
        for t in [connect, read].into_iter().flatten() {
            if !(1..=5).contains(&t) {
                return Err(JssError::InvalidData(format!(
                    "webhook timeouts are 1-5 seconds, not {t}"
                )));
            }
        }
        self.connection_timeout = connect;
        self.read_timeout = read;
        self.core.touch();
        Ok(())
    }

    /// Basic auth credentials sent with each request. The password is
    /// write-only.
    pub fn set_basic_auth(&mut self, credentials: Option<(&str, &str)>) {
        match credentials {
            Some((user, pass)) => {
                self.username = Some(user.to_owned());
                self.password = Some(pass.to_owned());
            }
            None => {
                self.username = None;
                self.password = None;
            }
        }
        self.core.touch();
    }
}

impl ApiObject for Webhook {
    const RSRC_BASE: &'static str = "webhooks";
    const RSRC_LIST_KEY: &'static str = "webhooks";
    const RSRC_OBJECT_KEY: &'static str = "webhook";

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        Ok(Self {
            core: ObjectCore::from_json(record)?,
            enabled: json::bool(record, "enabled"),
            url: json::opt_str(record, "url"),
            content_type: ContentType::parse(&json::string(record, "content_type")),
            event: json::opt_str(record, "event").and_then(|e| e.parse().ok()),
            smart_group_id: json::opt_i64(record, "smart_group_id").filter(|id| *id > 0),
            connection_timeout: json::opt_i64(record, "connection_timeout"),
            read_timeout: json::opt_i64(record, "read_timeout"),
            username: json::opt_str(record, "username"),
            password: None,
        })
    }
}

impl Writable for Webhook {
    fn rest_xml(&self) -> XmlElement {
        let auth = if self.username.is_some() { "BASIC" } else { "NONE" };
        let mut xml = XmlElement::new(Self::RSRC_OBJECT_KEY)
            .text_child("name", self.name())
            .bool_child("enabled", self.enabled)
            .opt_child("url", self.url.as_deref())
            .text_child("content_type", self.content_type.as_str())
            .opt_child("event", self.event)
            .opt_child("connection_timeout", self.connection_timeout)
            .opt_child("read_timeout", self.read_timeout)
            .text_child("authentication_type", auth)
            .opt_child("username", self.username.as_deref());
        if let Some(id) = self.smart_group_id {
            xml.push(XmlElement::with_text("smart_group_id", id));
        }
        if let Some(password) = &self.password {
            xml.push(XmlElement::with_text("password", password));
        }
        xml
    }

    fn on_saved(&mut self) {
        self.password = None;
    }
}

impl Creatable for Webhook {
    fn new_unsaved(name: &str) -> Self {
        Self {
            core: ObjectCore::new(name),
            enabled: true,
            url: None,
            content_type: ContentType::default(),
            event: None,
            smart_group_id: None,
            connection_timeout: None,
            read_timeout: None,
            username: None,
            password: None,
        }
    }

    fn validate_for_create(&self) -> Result<()> {
        let Some(event) = self.event else {
            return Err(JssError::MissingData("a webhook needs an event".into()));
        };
        if self.url.is_none() {
            return Err(JssError::MissingData("a webhook needs a URL".into()));
        }
        if event.watches_smart_group() && self.smart_group_id.is_none() {
            return Err(JssError::MissingData(format!("{event} webhooks need a smart group")));
        }
        Ok(())
    }
}

impl Updatable for Webhook {}
impl Deletable for Webhook {}

impl Jss {
    /// Point a smart-group event webhook at a smart group of the
    /// matching type.
    pub async fn set_webhook_smart_group(
        &self,
        hook: &mut Webhook,
        group: impl Into<Ident>,
    ) -> Result<()> {
        let ident = group.into();
        let entry = match hook.event {
            Some(WebhookEvent::SmartGroupComputerMembershipChange) => {
                self.lookup_entry::<ComputerGroup>(ident.clone()).await?
            }
            Some(WebhookEvent::SmartGroupMobileDeviceMembershipChange) => {
                self.lookup_entry::<MobileDeviceGroup>(ident.clone()).await?
            }
            Some(WebhookEvent::SmartGroupUserMembershipChange) => {
                self.lookup_entry::<UserGroup>(ident.clone()).await?
            }
            _ => {
                return Err(JssError::Unsupported(
                    "only smart group membership events watch a group".into(),
                ));
            }
        };
        let entry = entry.ok_or_else(|| JssError::NoSuchItem(format!("no group matches {ident}")))?;
        if !entry.get_bool("is_smart") {
            return Err(JssError::InvalidData(format!(
                "group '{}' is not a smart group",
                entry.name().unwrap_or_default()
            )));
        }
        hook.smart_group_id = entry.id();
        hook.core.touch();
        Ok(())
    }
}

pub mod channel;
pub mod error;
pub mod format;
pub mod hosted;
pub mod native;
pub mod recording;
pub mod redact;
pub mod router;
pub mod types;

pub use channel::NotifyChannel;
pub use error::{ChannelError, RequestError};
pub use hosted::HostedApiChannel;
pub use native::{MessagingSession, NativeChannel, UnpairedSession};
pub use recording::{RecordedMessage, RecordingChannel};
pub use router::DeliveryRouter;
pub use types::{ChannelAttempt, ChannelReport, DeliveryResult, NotificationRequest, Readiness, StatusChange};

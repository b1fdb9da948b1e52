//! Print notices for the foreground.
//!
//! Jobs run on the runtime's worker threads and never touch dashboard state.
//! They publish [`PrintEvent`]s on a broadcast channel instead; whoever shows
//! notices to staff subscribes.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PrintEvent {
    /// Discovery started
    Searching,
    /// No printer yet; the order waits in the pending slot
    Deferred { order: String, replaced: bool },
    /// Discovery could not start
    DiscoveryFailed,
    /// A matching printer answered discovery
    PrinterFound { name: String, address: String },
    Connecting { order: String },
    Sending { order: String },
    Printed { order: String },
    /// Job skipped but the printer state is known (offline, out of paper)
    Warning { order: String, message: String },
    Failed { order: String, message: String },
}

impl PrintEvent {
    /// Short text for a toast. Device codes never appear here.
    pub fn message(&self) -> String {
        match self {
            PrintEvent::Searching => "Searching for printer...".to_string(),
            PrintEvent::Deferred {
                order,
                replaced: false,
            } => format!("Order #{} will print once the printer is found", order),
            PrintEvent::Deferred {
                order,
                replaced: true,
            } => format!(
                "Order #{} replaces the order waiting for the printer",
                order
            ),
            PrintEvent::DiscoveryFailed => "Could not search for printers".to_string(),
            PrintEvent::PrinterFound { name, .. } => format!("Found printer: {}", name),
            PrintEvent::Connecting { order } => format!("Connecting to print order #{}", order),
            PrintEvent::Sending { order } => format!("Printing order #{}", order),
            PrintEvent::Printed { order } => format!("Order #{} printed", order),
            PrintEvent::Warning { order, message } | PrintEvent::Failed { order, message } => {
                format!("Order #{}: {}", order, message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let event = PrintEvent::Printed {
            order: "042".into(),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({ "event": "printed", "order": "042" })
        );
    }

    #[test]
    fn test_messages() {
        let event = PrintEvent::Deferred {
            order: "042".into(),
            replaced: true,
        };
        assert!(event.message().contains("replaces"));

        let event = PrintEvent::Failed {
            order: "7".into(),
            message: "Could not connect to the printer".into(),
        };
        assert_eq!(event.message(), "Order #7: Could not connect to the printer");
    }
}

use serde::Serialize;

/// A chat message attached to a generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// The speaker role, e.g. `user` or `assistant`.
    pub role: String,
    /// The message content.
    pub content: MessageContent,
}

/// The content of a chat message: either plain text or a list of typed
/// parts for multi-modal messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content.
    Text(String),
    /// Multi-content parts.
    Parts(Vec<ContentPart>),
}

/// One part of a multi-content chat message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// A text fragment.
    Text {
        /// The text.
        text: String,
    },
    /// An image, referenced by URL or inlined as a base64 data URI.
    Image {
        /// The image location.
        url: String,
    },
    /// An audio clip, referenced by URL or inlined as a base64 data URI.
    Audio {
        /// The audio location.
        url: String,
    },
    /// A video, referenced by URL or inlined as a base64 data URI.
    Video {
        /// The video location.
        url: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_content_is_untagged() {
        let msg = ChatMessage {
            role: "user".to_owned(),
            content: MessageContent::Text("hello".to_owned()),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn test_parts_are_tagged_by_type() {
        let msg = ChatMessage {
            role: "user".to_owned(),
            content: MessageContent::Parts(vec![
                ContentPart::Text {
                    text: "look:".to_owned(),
                },
                ContentPart::Image {
                    url: "https://example.com/cat.png".to_owned(),
                },
            ]),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][1]["type"], "image");
        assert_eq!(json["content"][1]["url"], "https://example.com/cat.png");
    }
}

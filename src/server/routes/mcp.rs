//! MCP Tool Catalogue
//!
//! Lists the tools an MCP bridge exposes on top of this API, together with
//! the voices and checkpoints currently available.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::server::routes::models::model_status;
use crate::server::server_core::ServerState;
use crate::server::types::{
    CustomVoiceEntry, McpDocsResponse, NativeVoiceEntry, ToolEntry, ToolParameter, VoiceCatalog,
};
use crate::voice::NATIVE_VOICES;

struct Tool {
    name: &'static str,
    description: &'static str,
    category: &'static str,
    parameters: &'static [ToolParameter],
}

const fn param(
    name: &'static str,
    required: bool,
    description: &'static str,
    example: &'static str,
) -> ToolParameter {
    ToolParameter {
        name,
        param_type: "string",
        required,
        description,
        example,
    }
}

const TOOLS: [Tool; 8] = [
    Tool {
        name: "tts_preset_voice",
        description: "Synthesize with a preset voice (native or custom)",
        category: "synthesis",
        parameters: &[
            param("text", true, "Text to synthesize", "Bonjour le monde"),
            param("voice", false, "Voice name (default: Serena)", "Serena"),
            param("language", false, "Language code (default: fr)", "fr"),
        ],
    },
    Tool {
        name: "tts_voice_design",
        description: "Synthesize with a voice described in natural language",
        category: "synthesis",
        parameters: &[
            param("text", true, "Text to synthesize", "Bienvenue dans notre application"),
            param(
                "voice_description",
                true,
                "Description of the voice",
                "Deep, warm male voice",
            ),
            param("language", false, "Language code (default: fr)", "fr"),
        ],
    },
    Tool {
        name: "tts_voice_clone",
        description: "Synthesize with a cloned voice from a cached prompt",
        category: "synthesis",
        parameters: &[
            param("text", true, "Text to synthesize", "Ceci est ma voix clonée"),
            param(
                "prompt_id",
                true,
                "Id returned by tts_create_clone_prompt",
                "abc123-def456",
            ),
            param("language", false, "Language code (default: fr)", "fr"),
        ],
    },
    Tool {
        name: "tts_get_voices",
        description: "List native and custom voices",
        category: "management",
        parameters: &[],
    },
    Tool {
        name: "tts_get_languages",
        description: "List supported languages",
        category: "management",
        parameters: &[],
    },
    Tool {
        name: "tts_create_clone_prompt",
        description: "Create a reusable clone prompt from reference audio",
        category: "advanced",
        parameters: &[
            param(
                "reference_audio_base64",
                true,
                "Base64 encoded reference audio",
                "UklGRiQA...",
            ),
            param(
                "reference_text",
                true,
                "Exact transcript of the reference audio",
                "Bonjour, je suis la voix de référence.",
            ),
            param("model", false, "'1.7B' (quality) or '0.6B' (fast)", "1.7B"),
            param("name", false, "Label for the prompt", "ma_voix"),
        ],
    },
    Tool {
        name: "tts_preset_instruct",
        description: "Synthesize with a native voice and a style instruction",
        category: "advanced",
        parameters: &[
            param("text", true, "Text to synthesize", "Je suis tellement content de vous voir !"),
            param("voice", false, "Native voice name", "Serena"),
            param("instruct", false, "Emotion or style instruction", "Joyful and excited"),
            param("language", false, "Language code", "fr"),
        ],
    },
    Tool {
        name: "tts_get_model_status",
        description: "Report loaded checkpoints and cached voices",
        category: "advanced",
        parameters: &[],
    },
];

/// JSON-RPC `tools/call` request filled with each parameter's example
fn call_example(tool: &Tool) -> Value {
    let arguments: Map<String, Value> = tool
        .parameters
        .iter()
        .map(|p| (p.name.to_string(), Value::from(p.example)))
        .collect();

    json!({
        "jsonrpc": "2.0",
        "method": "tools/call",
        "params": {
            "name": tool.name,
            "arguments": arguments,
        },
        "id": 1,
    })
}

fn tool_entries() -> Vec<ToolEntry> {
    TOOLS
        .iter()
        .map(|tool| ToolEntry {
            name: tool.name,
            description: tool.description,
            category: tool.category,
            parameters: tool.parameters,
            call_example: call_example(tool),
        })
        .collect()
}

/// `GET /mcp/docs`
pub async fn docs(State(state): State<Arc<ServerState>>) -> Json<McpDocsResponse> {
    let native: Vec<NativeVoiceEntry> = NATIVE_VOICES.iter().map(NativeVoiceEntry::from).collect();
    let custom: Vec<CustomVoiceEntry> = state
        .voices
        .list()
        .into_iter()
        .map(CustomVoiceEntry::from)
        .collect();

    Json(McpDocsResponse {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        device: state.backend.device(),
        tools: tool_entries(),
        voices: VoiceCatalog {
            native_count: native.len(),
            custom_count: custom.len(),
            native,
            custom,
        },
        models: model_status(&state),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tool_names_unique() {
        let names: HashSet<&str> = TOOLS.iter().map(|t| t.name).collect();
        assert_eq!(names.len(), TOOLS.len());
    }

    #[test]
    fn test_call_example_carries_every_parameter() {
        let entries = tool_entries();
        let clone = entries.iter().find(|t| t.name == "tts_voice_clone").unwrap();
        assert_eq!(clone.call_example["method"], "tools/call");
        assert_eq!(clone.call_example["params"]["name"], "tts_voice_clone");
        let arguments = clone.call_example["params"]["arguments"].as_object().unwrap();
        assert_eq!(arguments.len(), 3);
        assert_eq!(arguments["language"], "fr");

        let voices = entries.iter().find(|t| t.name == "tts_get_voices").unwrap();
        assert!(voices.call_example["params"]["arguments"].as_object().unwrap().is_empty());
    }
}

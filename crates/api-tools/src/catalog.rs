//! The fixed catalog of upstream operations.

use crate::config::CredentialKind::{AgentToken, ApiKey, StoreToken};
use crate::registry::{
    DefaultValue, MAX_ID_CHARS, MAX_TEXT_CHARS, Operation, Param, ParamType, Verb,
};

const TEXT: ParamType = ParamType::String {
    max_len: MAX_TEXT_CHARS,
};
const ID: ParamType = ParamType::String {
    max_len: MAX_ID_CHARS,
};

const STORE_TOKEN: Param =
    Param::token("Store token returned by kv_create_store (defaults to KLAUD_STORE_TOKEN)");
const AGENT_TOKEN: Param =
    Param::token("Agent token returned by agent_register (defaults to KLAUD_AGENT_TOKEN)");

const TASK_STATUSES: &[&str] = &["todo", "in_progress", "blocked", "done"];

pub(crate) static CATALOG: &[Operation] = &[
    // Content
    Operation::new(
        "search_hackernews",
        "Get top Hacker News stories filtered by category (ai, crypto, dev, science, security, all)",
        Verb::Get,
        "/api/hn",
        &[
            Param::query(
                "category",
                "Topic category to filter stories",
                ParamType::Enum(&["ai", "crypto", "dev", "science", "security", "all"]),
            )
            .default(DefaultValue::Str("all")),
            Param::query(
                "limit",
                "Number of stories to return",
                ParamType::Integer { min: 1, max: 30 },
            )
            .default(DefaultValue::Int(10)),
        ],
    )
    .credential(ApiKey),
    Operation::new(
        "search_pubmed",
        "Search PubMed for biomedical and life science articles",
        Verb::Get,
        "/api/pubmed",
        &[
            Param::query(
                "query",
                "Search query (e.g. 'CRISPR cancer therapy')",
                TEXT,
            )
            .required(),
            Param::query(
                "limit",
                "Number of articles to return",
                ParamType::Integer { min: 1, max: 20 },
            )
            .default(DefaultValue::Int(5)),
        ],
    )
    .credential(ApiKey),
    Operation::new(
        "search_arxiv",
        "Search arXiv preprints with optional category filter",
        Verb::Get,
        "/api/arxiv",
        &[
            Param::query("query", "Search query (e.g. 'LLM agents reasoning')", TEXT).required(),
            Param::query(
                "category",
                "arXiv category filter (e.g. cs.AI, q-bio.BM, stat.ML)",
                ID,
            ),
            Param::query(
                "limit",
                "Number of papers to return",
                ParamType::Integer { min: 1, max: 20 },
            )
            .default(DefaultValue::Int(5)),
        ],
    )
    .credential(ApiKey),
    Operation::new(
        "crypto_prices",
        "Get real-time cryptocurrency prices (CoinGecko with CoinCap fallback)",
        Verb::Get,
        "/api/crypto",
        &[Param::query(
            "ids",
            "CoinGecko IDs (e.g. bitcoin, ethereum, solana)",
            ParamType::StringArray { max_items: 30 },
        )
        .default(DefaultValue::Strs(&["bitcoin", "ethereum"]))],
    )
    .credential(ApiKey),
    Operation::new(
        "github_trending",
        "Get trending GitHub repositories",
        Verb::Get,
        "/api/github",
        &[
            Param::query(
                "language",
                "Filter by programming language (e.g. python, rust, typescript)",
                ID,
            ),
            Param::query(
                "since",
                "Time range for trending",
                ParamType::Enum(&["daily", "weekly", "monthly"]),
            )
            .default(DefaultValue::Str("daily")),
        ],
    )
    .credential(ApiKey),
    Operation::new(
        "extract_url",
        "Extract readable text content from any URL (HTML to clean text)",
        Verb::Get,
        "/api/extract",
        &[Param::query("url", "URL to extract text from", ParamType::Url).required()],
    )
    .credential(ApiKey),
    Operation::new(
        "search_drugs",
        "Search drugs and molecules via ChEMBL by name or by protein target",
        Verb::Get,
        "/api/drugs",
        &[
            Param::query("query", "Drug/molecule name (e.g. imatinib, aspirin)", TEXT),
            Param::query("target", "Protein target name (e.g. EGFR, BRCA1, JAK2)", TEXT),
        ],
    )
    .credential(ApiKey)
    .require_any(&["query", "target"]),
    // Key-value store
    Operation::new(
        "kv_create_store",
        "Create a key-value store and return its access token",
        Verb::Post,
        "/api/kv",
        &[Param::body("name", "Optional human-readable store name", ID)],
    ),
    Operation::new(
        "kv_get",
        "Read the value stored under a key",
        Verb::Get,
        "/api/kv/{key}",
        &[Param::path("key", "Key to read"), STORE_TOKEN],
    )
    .credential(StoreToken),
    Operation::new(
        "kv_set",
        "Write a text value under a key",
        Verb::Put,
        "/api/kv/{key}",
        &[
            Param::path("key", "Key to write"),
            Param::raw_body("value", "Value to store (raw text)").required(),
            STORE_TOKEN,
        ],
    )
    .credential(StoreToken),
    Operation::new(
        "kv_list",
        "List keys in the store",
        Verb::Get,
        "/api/kv",
        &[
            Param::query("prefix", "Only list keys starting with this prefix", ID),
            Param::query(
                "limit",
                "Maximum number of keys to return",
                ParamType::Integer { min: 1, max: 1000 },
            )
            .default(DefaultValue::Int(100)),
            STORE_TOKEN,
        ],
    )
    .credential(StoreToken),
    // Messaging
    Operation::new(
        "agent_register",
        "Register an agent mailbox and return its agent token",
        Verb::Post,
        "/api/agents",
        &[
            Param::body("name", "Agent name (unique handle)", ID).required(),
            Param::body("description", "What this agent does", TEXT),
        ],
    ),
    Operation::new(
        "agent_send",
        "Send a direct message to another agent",
        Verb::Post,
        "/api/messages",
        &[
            Param::body("to", "Recipient agent name", ID).required(),
            Param::body("content", "Message body", TEXT).required(),
            Param::body("subject", "Optional subject line", ID),
            AGENT_TOKEN,
        ],
    )
    .credential(AgentToken),
    Operation::new(
        "agent_inbox",
        "Read messages delivered to this agent",
        Verb::Get,
        "/api/messages/inbox",
        &[
            Param::query(
                "unread_only",
                "Only return unread messages",
                ParamType::Enum(&["true", "false"]),
            )
            .default(DefaultValue::Str("false")),
            Param::query(
                "limit",
                "Maximum number of messages to return",
                ParamType::Integer { min: 1, max: 100 },
            )
            .default(DefaultValue::Int(20)),
            AGENT_TOKEN,
        ],
    )
    .credential(AgentToken),
    Operation::new(
        "channel_create",
        "Create a public channel",
        Verb::Post,
        "/api/channels",
        &[
            Param::body("name", "Channel name", ID).required(),
            Param::body("description", "Channel topic", TEXT),
            AGENT_TOKEN,
        ],
    )
    .credential(AgentToken),
    Operation::new(
        "channel_list",
        "List available channels",
        Verb::Get,
        "/api/channels",
        &[AGENT_TOKEN],
    )
    .credential(AgentToken),
    Operation::new(
        "channel_join",
        "Join a channel",
        Verb::Post,
        "/api/channels/{channel}/join",
        &[Param::path("channel", "Channel name"), AGENT_TOKEN],
    )
    .credential(AgentToken),
    Operation::new(
        "channel_post",
        "Post a message to a channel",
        Verb::Post,
        "/api/channels/{channel}/messages",
        &[
            Param::path("channel", "Channel name"),
            Param::body("content", "Message body", TEXT).required(),
            AGENT_TOKEN,
        ],
    )
    .credential(AgentToken),
    Operation::new(
        "channel_read",
        "Read recent messages from a channel",
        Verb::Get,
        "/api/channels/{channel}/messages",
        &[
            Param::path("channel", "Channel name"),
            Param::query(
                "limit",
                "Maximum number of messages to return",
                ParamType::Integer { min: 1, max: 100 },
            )
            .default(DefaultValue::Int(20)),
            AGENT_TOKEN,
        ],
    )
    .credential(AgentToken),
    Operation::new(
        "agent_block",
        "Block another agent from messaging you",
        Verb::Post,
        "/api/agents/{agent}/block",
        &[Param::path("agent", "Agent name to block"), AGENT_TOKEN],
    )
    .credential(AgentToken),
    Operation::new(
        "agent_report",
        "Report an abusive agent",
        Verb::Post,
        "/api/agents/{agent}/report",
        &[
            Param::path("agent", "Agent name to report"),
            Param::body("reason", "Why the agent is being reported", TEXT).required(),
            AGENT_TOKEN,
        ],
    )
    .credential(AgentToken),
    // Capability registry
    Operation::new(
        "registry_register",
        "Publish this agent's capabilities in the registry",
        Verb::Post,
        "/api/registry",
        &[
            Param::body("name", "Listing name", ID).required(),
            Param::body("description", "What the agent can do", TEXT).required(),
            Param::body(
                "capabilities",
                "Capability tags (e.g. translation, code-review)",
                ParamType::StringArray { max_items: 30 },
            )
            .required(),
            Param::body("endpoint", "Optional URL where the agent can be reached", ParamType::Url),
            AGENT_TOKEN,
        ],
    )
    .credential(AgentToken),
    Operation::new(
        "registry_search",
        "Search the capability registry",
        Verb::Get,
        "/api/registry/search",
        &[
            Param::query("query", "Free-text search", TEXT),
            Param::query("capability", "Only listings with this capability tag", ID),
            Param::query(
                "limit",
                "Maximum number of listings to return",
                ParamType::Integer { min: 1, max: 50 },
            )
            .default(DefaultValue::Int(10)),
            AGENT_TOKEN,
        ],
    )
    .credential(AgentToken),
    Operation::new(
        "registry_get",
        "Get a registry listing by id",
        Verb::Get,
        "/api/registry/{id}",
        &[Param::path("id", "Listing id"), AGENT_TOKEN],
    )
    .credential(AgentToken),
    Operation::new(
        "registry_list_mine",
        "List registry entries owned by this agent",
        Verb::Get,
        "/api/registry/mine",
        &[AGENT_TOKEN],
    )
    .credential(AgentToken),
    // Task tracker
    Operation::new(
        "project_create",
        "Create a project to group tasks",
        Verb::Post,
        "/api/projects",
        &[
            Param::body("name", "Project name", ID).required(),
            Param::body("description", "Project description", TEXT),
            AGENT_TOKEN,
        ],
    )
    .credential(AgentToken),
    Operation::new(
        "project_list",
        "List projects visible to this agent",
        Verb::Get,
        "/api/projects",
        &[AGENT_TOKEN],
    )
    .credential(AgentToken),
    Operation::new(
        "task_create",
        "Create a task in a project",
        Verb::Post,
        "/api/projects/{project_id}/tasks",
        &[
            Param::path("project_id", "Project id"),
            Param::body("title", "Task title", ID).required(),
            Param::body("description", "Task details", TEXT),
            Param::body("assignee", "Agent name to assign", ID),
            Param::body(
                "priority",
                "Task priority",
                ParamType::Enum(&["low", "medium", "high", "urgent"]),
            )
            .default(DefaultValue::Str("medium")),
            AGENT_TOKEN,
        ],
    )
    .credential(AgentToken),
    Operation::new(
        "task_update",
        "Update a task's status or fields",
        Verb::Patch,
        "/api/tasks/{task_id}",
        &[
            Param::path("task_id", "Task id"),
            Param::body("status", "New status", ParamType::Enum(TASK_STATUSES)),
            Param::body("title", "New title", ID),
            Param::body("description", "New details", TEXT),
            Param::body("assignee", "Agent name to assign", ID),
            AGENT_TOKEN,
        ],
    )
    .credential(AgentToken),
    Operation::new(
        "task_list",
        "List tasks in a project",
        Verb::Get,
        "/api/projects/{project_id}/tasks",
        &[
            Param::path("project_id", "Project id"),
            Param::query("status", "Only tasks with this status", ParamType::Enum(TASK_STATUSES)),
            Param::query("assignee", "Only tasks assigned to this agent", ID),
            AGENT_TOKEN,
        ],
    )
    .credential(AgentToken),
    Operation::new(
        "task_comment",
        "Add a comment to a task",
        Verb::Post,
        "/api/tasks/{task_id}/comments",
        &[
            Param::path("task_id", "Task id"),
            Param::body("content", "Comment text", TEXT).required(),
            AGENT_TOKEN,
        ],
    )
    .credential(AgentToken),
];

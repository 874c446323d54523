//! Predefined agent catalog
//!
//! Built-in specialists a node can be populated from. Entries are read-only;
//! [`instantiate`] hands out owned copies so per-node edits never reach the
//! catalog or sibling nodes.

use std::sync::LazyLock;

use crate::models::agent::{max_iters, AgentConfig, AgentKind, DEFAULT_MODEL};
use crate::models::workflow::{NodeData, NodeKind, Position, WorkflowNode};

static PREDEFINED_AGENTS: LazyLock<Vec<AgentConfig>> = LazyLock::new(|| {
    vec![
        entry(
            "router",
            "Router",
            AgentKind::Router,
            "Routing agent - analyses user intent and dispatches tasks",
            "You are an intelligent routing assistant. Analyse each user request and dispatch it to the most suitable specialist agent.",
            &[],
            10,
        ),
        entry(
            "code_agent",
            "CodeMaster",
            AgentKind::Code,
            "Code generation agent - produces amis configurations and frontend code",
            "You are CodeMaster, a professional code generation assistant. You specialise in amis low-code JSON configurations and frontend component code.",
            &["amis-code-assistant"],
            30,
        ),
        entry(
            "pptx_agent",
            "SlideCreator",
            AgentKind::Pptx,
            "Slide deck agent - creates and edits presentations",
            "You are SlideCreator, a professional presentation assistant. You specialise in creating and editing PowerPoint presentations.",
            &["pptx"],
            30,
        ),
        entry(
            "data_agent",
            "DataAnalyst",
            AgentKind::Data,
            "Data analysis agent - data processing and visualisation",
            "You are DataAnalyst, a professional data analysis assistant. You specialise in data analysis, SQL queries and chart visualisation.",
            &["data-analysis"],
            30,
        ),
        entry(
            "policy_qa_agent",
            "PolicyQA",
            AgentKind::Policy,
            "Policy QA agent - answers questions about company rules and regulations",
            "You are the company policy assistant. Answer employee questions about company rules and regulations.",
            &["company-policy-qa"],
            10,
        ),
        entry(
            "ocr_agent",
            "OCRReader",
            AgentKind::Ocr,
            "Document OCR agent - extracts text from PDFs and images",
            "You are OCRReader, a professional OCR assistant. You specialise in recognising the text content of PDF files and images.",
            &["ocr-file-reader"],
            10,
        ),
        entry(
            "skill_creator_agent",
            "SkillCreator",
            AgentKind::SkillCreator,
            "Skill authoring agent - creates new skill packages",
            "You are SkillCreator, a professional skill authoring assistant. You design skill package structures and write SKILL.md documents.",
            &["skill-creator"],
            30,
        ),
    ]
});

fn entry(
    id: &str,
    name: &str,
    kind: AgentKind,
    description: &str,
    system_prompt: &str,
    skills: &[&str],
    iters: u32,
) -> AgentConfig {
    AgentConfig {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        description: description.to_string(),
        system_prompt: system_prompt.to_string(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        model: DEFAULT_MODEL.to_string(),
        max_iters: max_iters(iters),
        temperature: None,
        enable_thinking: None,
        stream: None,
        custom_params: None,
        input_variables: None,
    }
}

/// All predefined agents, in catalog order
pub fn predefined_agents() -> &'static [AgentConfig] {
    &PREDEFINED_AGENTS
}

/// An owned copy of the catalog entry with `template_id`
pub fn instantiate(template_id: &str) -> Option<AgentConfig> {
    PREDEFINED_AGENTS
        .iter()
        .find(|agent| agent.id == template_id)
        .cloned()
}

/// Build an agent node from a catalog entry
pub fn agent_node(
    template_id: &str,
    node_id: impl Into<String>,
    position: Position,
) -> Option<WorkflowNode> {
    let agent = instantiate(template_id)?;
    let data = NodeData {
        label: agent.name.clone(),
        agent_config: Some(agent),
        ..Default::default()
    };

    let mut node = WorkflowNode::new(node_id, NodeKind::Agent, data);
    node.position = position;
    Some(node)
}

/// Skills referenced by the catalog, first occurrence order
pub fn known_skills() -> Vec<String> {
    let mut skills: Vec<String> = Vec::new();
    for skill in PREDEFINED_AGENTS.iter().flat_map(|a| a.skills.iter()) {
        if !skills.contains(skill) {
            skills.push(skill.clone());
        }
    }
    skills
}

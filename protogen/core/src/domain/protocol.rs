// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Protocol request and response models
//!
//! Payloads accepted by the HTTP API and the CLI. Each request knows how to
//! validate its own required fields; prompt construction lives in
//! `infrastructure::prompts`.

use serde::{Deserialize, Serialize};

use super::llm::ProviderId;

/// Supported laboratory techniques.
pub const TECHNIQUES: &[&str] = &[
    "PCR",
    "qPCR",
    "Gibson Assembly",
    "Miniprep",
    "Gel Electrophoresis",
    "Restriction Digestion",
    "Ligation",
    "Transformation",
    "Western Blot",
    "ELISA",
    "Other",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} must be at least {min_length} characters")]
pub struct ValidationError {
    pub field: &'static str,
    pub min_length: usize,
}

fn require(field: &'static str, value: &str, min_length: usize) -> Result<(), ValidationError> {
    if value.trim().chars().count() < min_length {
        return Err(ValidationError { field, min_length });
    }
    Ok(())
}

fn default_reaction_volume() -> Option<String> {
    Some("25".to_string())
}

fn default_num_reactions() -> Option<String> {
    Some("1".to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolGenerationRequest {
    /// e.g. "Amplify a gene for cloning"
    pub experimental_goal: String,
    /// e.g. "PCR", "Gibson Assembly"
    pub technique: String,
    /// Key reagents/enzymes, e.g. "Q5 Polymerase"
    pub reagents: String,
    /// e.g. "Human genomic DNA, 50 ng/µL"
    pub template_details: String,
    #[serde(default)]
    pub primer_details: Option<String>,
    #[serde(default)]
    pub amplicon_size: Option<String>,
    /// Reaction volume in µL
    #[serde(default = "default_reaction_volume")]
    pub reaction_volume: Option<String>,
    #[serde(default = "default_num_reactions")]
    pub num_reactions: Option<String>,
    #[serde(default)]
    pub other_params: Option<String>,
    #[serde(default)]
    pub llm_provider: ProviderId,
}

impl ProtocolGenerationRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("experimental_goal", &self.experimental_goal, 10)?;
        require("technique", &self.technique, 2)?;
        require("reagents", &self.reagents, 3)?;
        require("template_details", &self.template_details, 5)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TroubleshootingRequest {
    pub observed_problem: String,
    pub original_protocol: String,
    #[serde(default)]
    pub additional_details: Option<String>,
    #[serde(default)]
    pub technique: Option<String>,
    #[serde(default)]
    pub llm_provider: ProviderId,
}

impl TroubleshootingRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("observed_problem", &self.observed_problem, 10)?;
        require("original_protocol", &self.original_protocol, 20)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteGenRequest {
    /// e.g. "Express and purify a His-tagged protein in E. coli"
    pub overarching_goal: String,
    pub starting_material: String,
    pub target_organism: String,
    #[serde(default)]
    pub constraints: Option<String>,
    #[serde(default)]
    pub llm_provider: ProviderId,
}

impl RouteGenRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("overarching_goal", &self.overarching_goal, 10)?;
        require("starting_material", &self.starting_material, 3)?;
        require("target_organism", &self.target_organism, 2)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolGenRequest {
    pub user_goal: String,
    /// Current step, e.g. "Primer Design"
    pub technique: String,
    /// e.g. "Paired-end Illumina Reads"
    pub data_type: String,
    #[serde(default)]
    pub additional_context: Option<String>,
    #[serde(default)]
    pub llm_provider: ProviderId,
}

impl ToolGenRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("user_goal", &self.user_goal, 10)?;
        require("technique", &self.technique, 3)?;
        require("data_type", &self.data_type, 3)
    }
}

/// Response for protocol generation and troubleshooting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolResponse {
    pub success: bool,
    /// Markdown protocol or troubleshooting analysis
    pub protocol: String,
    pub provider_used: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteGenResponse {
    pub success: bool,
    pub routes: String,
    pub provider_used: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolGenResponse {
    pub success: bool,
    pub recommendations: String,
    pub provider_used: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub available_providers: Vec<ProviderId>,
}

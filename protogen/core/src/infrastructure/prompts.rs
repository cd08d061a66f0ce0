// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Prompt Templates
//!
//! System prompts and Handlebars user-prompt templates for the four
//! protocol operations.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Turn validated request payloads into `(system, user)` prompt pairs
//!
//! Templates are rendered without HTML escaping; request text is passed to
//! the model verbatim.

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde_json::json;

use crate::domain::protocol::{
    ProtocolGenerationRequest, RouteGenRequest, ToolGenRequest, TroubleshootingRequest,
};

// ============================================================================
// System prompts
// ============================================================================

pub const PROTOCOL_SYSTEM_PROMPT: &str = "You are Proto-Gen, an expert molecular biologist who writes laboratory protocols. \
Produce accurate, detailed and safe protocols in clean Markdown. Work step by step and double-check every calculation.

Core knowledge:
- A PCR reaction contains polymerase, dNTPs, buffer, MgCl2, forward and reverse primers, template DNA and nuclease-free water.
- Set the annealing temperature 3-5 °C below the lower primer Tm. If Tm is unknown, say it must be calculated and use a placeholder.
- Extension time is 30-60 s per kb depending on the polymerase (Taq ~60 s/kb, Q5 ~30 s/kb).
- Default to a 25 µL final volume unless told otherwise.
- Master mixes are calculated for N+1 reactions.
- Gibson Assembly: 50-100 ng total DNA, equimolar fragments, 50 °C for 15-60 min.
- Miniprep: alkaline lysis, A260/A280 of 1.8-2.0 for pure DNA.
- Gel electrophoresis: 0.8-2% agarose at 80-120 V with loading dye and a ladder.
- Restriction digestion: 1-2 U enzyme per µg DNA, check buffer compatibility for double digests.
- Ligation: T4 DNA ligase, insert:vector 3:1 to 5:1.
- Transformation: heat shock chemically competent cells at 42 °C for 30-45 s and plate on selective media.
Always finish with a Notes & Pitfalls section.";

pub const TROUBLESHOOTING_SYSTEM_PROMPT: &str = "You are Proto-Gen, an expert molecular biology troubleshooter. \
A researcher brings you a failed experiment. Analyse their protocol and the reported failure, rank the most likely causes, \
and give specific, actionable fixes with your reasoning.

Reference points:
- PCR with no product: degraded or wrong primers, annealing too high, dead enzyme, too little template, missing reagent, inhibitors.
- PCR smears: too much template, annealing too low, too many cycles, degraded template.
- Multiple bands or primer dimers: raise annealing temperature, use hot-start polymerase, tune MgCl2 (1.5-3 mM), redesign primers.
- Gibson Assembly with no colonies: overlaps outside 15-40 bp, poor insert:vector ratio, incompletely linearised vector.
- Miniprep with low yield or purity: poor growth, low-copy plasmid, incomplete lysis, protein carry-over.
- Transformation with no colonies: cells not competent, wrong heat shock, wrong antibiotic, failed ligation.";

pub const ROUTE_SYSTEM_PROMPT: &str = "You are Route-Gen, a molecular biology experimental design consultant. \
Given a complex scientific goal, propose 2-3 distinct high-level experimental routes. Think in multi-step workflows and \
compare the trade-offs in time, cost and final product quality. Include realistic time estimates and resource needs, \
and end with actionable next steps.";

pub const TOOL_SYSTEM_PROMPT: &str = "You are Tool-Gen, a computational molecular biology and bioinformatics specialist. \
Recommend the best software for one step of the user's project and explain how to use it. Weight relevance twice as \
heavily as price or accessibility, and prefer free or open-source tools when their relevance is excellent.

Well-known options include Primer3, Primer-BLAST, SnapGene, Benchling, Galaxy, FastQC, QIIME2, ChimeraX, PyMOL, \
AlphaFold, DESeq2, edgeR, IGV and the UCSC and Ensembl genome browsers.";

// ============================================================================
// User prompt templates
// ============================================================================

const PROTOCOL_TEMPLATE: &str = r#"**USER REQUEST**

**Goal:** {{experimental_goal}}
**Technique:** {{technique}}
**Core Reagents/Enzyme:** {{reagents}}
**Template DNA:** {{template_details}}
**Reaction Volume:** {{reaction_volume}} µL
**Number of Reactions:** {{num_reactions}}
{{#if primer_details}}**Primers:** {{primer_details}}
{{/if}}{{#if amplicon_size}}**Desired Amplicon Size:** {{amplicon_size}}
{{/if}}{{#if other_params}}**Other Parameters:** {{other_params}}
{{/if}}
---
**YOUR TASK**

Using the request above and your core knowledge, write a complete step-by-step protocol.

**Output Format:**

### **Protocol: [title based on the goal]**

**1. Materials and Reagents**
- Every component needed, including those implied by the technique.

**2. Master Mix Calculation (for {{n_plus_one}} reactions)**
- A Markdown table with columns: Reagent, Volume per Reaction (µL), Volume for Master Mix (µL).
- Standard concentrations in a final volume of {{reaction_volume}} µL.

{{#if thermocycled}}**3. Thermocycler Program**
- A Markdown table with columns: Step, Temperature (°C), Time.
- Initial denaturation, denaturation, annealing (state the temperature and why), extension (from amplicon size and polymerase), final extension and hold.

**4. Procedure**
- Numbered steps from thawing reagents on ice through running the program and checking the product on a gel.
{{else}}**3. Procedure Steps**
- A numbered list with temperatures, times and equipment settings where they apply.
{{/if}}
**5. Notes & Pitfalls**
- At least 3 critical warnings for this protocol.

**6. Expected Results**
- What success looks like and which QC checks to run."#;

const TROUBLESHOOTING_TEMPLATE: &str = r#"**USER'S FAILED EXPERIMENT**

**Observed Problem:** "{{observed_problem}}"

**Original Protocol Used:**
```
{{original_protocol}}
```
{{#if technique}}
**Technique Used:** {{technique}}
{{/if}}{{#if additional_details}}
**Additional Details:** "{{additional_details}}"
{{/if}}
---
**YOUR TASK**

Rank the potential causes from most to least probable.

**Output Format:**

### **Troubleshooting Analysis for: [Observed Problem]**

For each cause (3-4 of them):
**N. Potential Cause: [name]**
   - **Reasoning:** why it fits this protocol and symptom.
   - **Suggested Solution:** a concrete experimental change that tests it.

**Further Questions:** clarifying questions if the information is insufficient.

**Quick Checklist:** a bulleted list of things to verify before the next run."#;

const ROUTE_TEMPLATE: &str = r#"**Overarching Goal:** {{overarching_goal}}
**Starting Material:** {{starting_material}}
**Target/Organism:** {{target_organism}}
**Key Constraints:** {{#if constraints}}{{constraints}}{{else}}None specified{{/if}}

---

**YOUR TASK**

Generate 2-3 distinct experimental routes to achieve this goal.

**Output Format:**

# Experimental Design Analysis for: {{overarching_goal}}

For each route (Standard, Fast-Track, High-Quality/Robust):
## Route N: [name]
**Summary:** one sentence.
**Workflow (Step-by-Step):** numbered techniques and QC checks, each marked **[Protocol Link: Yes/No]**.
**Estimated Timeline:** e.g. 3-5 days.
**Pros:** / **Cons:** bulleted.

## Final Recommendation
Which route to start with given the constraints, and the next steps."#;

const TOOL_TEMPLATE: &str = r#"**Task Context:**
**Project Goal:** {{user_goal}}
**Current Step/Technique:** {{technique}}
**Input Data Type:** {{data_type}}
{{#if additional_context}}**Additional Context:** {{additional_context}}
{{/if}}
---

**YOUR TASK**

1. Select the single best tool for this step using the 2:1 relevance:price weighting.
2. Write a step-by-step guide for using it on this task.
3. Point to a relevant video tutorial.

**Output Format:**

# Computational Step: {{technique}}

## Recommended Tool
A Markdown table with Tool Name (with link), Price/Accessibility and Recommendation Rationale.

## Step-by-Step Usage Guide
Five numbered, specific actions ending with how to interpret the result.

## Video Tutorial
A titled link with a one-line description.

## Tips for Success
Two tips and one alternative tool."#;

/// Techniques that get a thermocycler program section.
const THERMOCYCLED: &[&str] = &["PCR", "qPCR"];

/// A rendered `(system, user)` prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: &'static str,
    pub user: String,
}

pub struct PromptLibrary {
    handlebars: Handlebars<'static>,
}

impl PromptLibrary {
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(handlebars::no_escape);

        for (name, template) in [
            ("protocol", PROTOCOL_TEMPLATE),
            ("troubleshooting", TROUBLESHOOTING_TEMPLATE),
            ("routes", ROUTE_TEMPLATE),
            ("tools", TOOL_TEMPLATE),
        ] {
            handlebars
                .register_template_string(name, template)
                .with_context(|| format!("Invalid prompt template: {}", name))?;
        }

        Ok(Self { handlebars })
    }

    pub fn protocol(&self, request: &ProtocolGenerationRequest) -> Result<PromptPair> {
        let reaction_volume = non_blank(request.reaction_volume.as_deref()).unwrap_or("25");
        let num_reactions = non_blank(request.num_reactions.as_deref()).unwrap_or("1");

        let data = json!({
            "experimental_goal": request.experimental_goal,
            "technique": request.technique,
            "reagents": request.reagents,
            "template_details": request.template_details,
            "primer_details": non_blank(request.primer_details.as_deref()),
            "amplicon_size": non_blank(request.amplicon_size.as_deref()),
            "other_params": non_blank(request.other_params.as_deref()),
            "reaction_volume": reaction_volume,
            "num_reactions": num_reactions,
            "n_plus_one": master_mix_count(num_reactions),
            "thermocycled": THERMOCYCLED.contains(&request.technique.trim()),
        });

        Ok(PromptPair {
            system: PROTOCOL_SYSTEM_PROMPT,
            user: self.render("protocol", &data)?,
        })
    }

    pub fn troubleshooting(&self, request: &TroubleshootingRequest) -> Result<PromptPair> {
        let data = json!({
            "observed_problem": request.observed_problem,
            "original_protocol": request.original_protocol,
            "technique": non_blank(request.technique.as_deref()),
            "additional_details": non_blank(request.additional_details.as_deref()),
        });

        Ok(PromptPair {
            system: TROUBLESHOOTING_SYSTEM_PROMPT,
            user: self.render("troubleshooting", &data)?,
        })
    }

    pub fn routes(&self, request: &RouteGenRequest) -> Result<PromptPair> {
        let data = json!({
            "overarching_goal": request.overarching_goal,
            "starting_material": request.starting_material,
            "target_organism": request.target_organism,
            "constraints": non_blank(request.constraints.as_deref()),
        });

        Ok(PromptPair {
            system: ROUTE_SYSTEM_PROMPT,
            user: self.render("routes", &data)?,
        })
    }

    pub fn tools(&self, request: &ToolGenRequest) -> Result<PromptPair> {
        let data = json!({
            "user_goal": request.user_goal,
            "technique": request.technique,
            "data_type": request.data_type,
            "additional_context": non_blank(request.additional_context.as_deref()),
        });

        Ok(PromptPair {
            system: TOOL_SYSTEM_PROMPT,
            user: self.render("tools", &data)?,
        })
    }

    fn render(&self, name: &str, data: &serde_json::Value) -> Result<String> {
        self.handlebars
            .render(name, data)
            .with_context(|| format!("Failed to render {} prompt", name))
    }
}

/// Reactions to prepare master mix for: N+1, or 2 when N does not parse.
pub fn master_mix_count(num_reactions: &str) -> u32 {
    num_reactions
        .trim()
        .parse::<u32>()
        .ok()
        .and_then(|n| n.checked_add(1))
        .unwrap_or(2)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

//! System prompts for specialised roles
//!
//! Each role has a system prompt that defines its responsibilities and the
//! shape of its contribution. The first line names the role and its team.

mod coordination;
mod creative;
mod research;
mod technical;

pub use coordination::{QUALITY_ASSURANCE_PROMPT, RESOURCE_MANAGER_PROMPT, TEAM_COORDINATOR_PROMPT};
pub use creative::{CONTENT_CREATOR_PROMPT, CREATIVE_STRATEGIST_PROMPT, VISUAL_DESIGNER_PROMPT};
pub use research::{DATA_ANALYST_PROMPT, REPORT_WRITER_PROMPT, RESEARCH_SPECIALIST_PROMPT};
pub use technical::{DEVELOPER_PROMPT, QA_ENGINEER_PROMPT, SYSTEM_ARCHITECT_PROMPT};

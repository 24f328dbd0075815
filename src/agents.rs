//! Agent personas and the tasks assigned to them.
//!
//! Each pipeline stage is played by one agent: a role, a goal and a
//! backstory that together become the system message of that stage's model
//! call. A [`Task`] pairs an agent with a description and the output it is
//! expected to produce.

use std::fmt;

/// A role-bound persona driving one stage's language-model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Agent {
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
}

impl Agent {
    /// System message for a call made by this agent.
    pub fn system_prompt(&self, expected_output: &str) -> String {
        format!(
            "You are {}. {}. Your goal: {}.\nExpected output: {}",
            self.role, self.backstory, self.goal, expected_output
        )
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.role)
    }
}

pub const BLOOD_TEST_ANALYZER: Agent = Agent {
    role: "Blood Test Analyzer",
    goal: "Analyze blood test results accurately",
    backstory: "Expert in interpreting blood tests with years of laboratory experience",
};

pub const WEB_SEARCH_SPECIALIST: Agent = Agent {
    role: "Web Search Specialist",
    goal: "Find relevant and reliable health information",
    backstory: "Skilled online health researcher with a knack for finding credible medical information",
};

pub const HEALTH_RECOMMENDATIONS_EXPERT: Agent = Agent {
    role: "Health Recommendations Expert",
    goal: "Provide personalized health recommendations",
    backstory: "Experienced health advisor with a comprehensive understanding of medical test results and lifestyle factors",
};

/// One unit of work for an agent.
#[derive(Debug, Clone)]
pub struct Task {
    pub description: String,
    pub expected_output: &'static str,
    pub agent: &'static Agent,
}

impl Task {
    pub fn system_prompt(&self) -> String {
        self.agent.system_prompt(self.expected_output)
    }

    /// Short label used in the "task completed" log line.
    pub fn summary(&self) -> String {
        self.description.chars().take(50).collect()
    }
}

/// Build the analyze / search / recommend tasks for one report excerpt.
pub fn create_tasks(report_excerpt: &str) -> [Task; 3] {
    [
        Task {
            description: format!(
                "Analyze this blood test report and provide a summary: {report_excerpt}..."
            ),
            expected_output:
                "A detailed summary of the blood test results, highlighting any abnormal values.",
            agent: &BLOOD_TEST_ANALYZER,
        },
        Task {
            description: "Search for relevant health articles based on the blood test analysis"
                .to_string(),
            expected_output: "A list of relevant health articles with their titles and URLs.",
            agent: &WEB_SEARCH_SPECIALIST,
        },
        Task {
            description: "Generate personalized health recommendations based on the blood test analysis and research findings".to_string(),
            expected_output: "A set of personalized health recommendations based on the blood test results and researched information.",
            agent: &HEALTH_RECOMMENDATIONS_EXPERT,
        },
    ]
}

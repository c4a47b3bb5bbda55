// Role-conditioned prompt templates used when a question escalates past the FAQ.

use crate::knowledge::Role;
use crate::memory::UserMemory;

pub const STUDENT_PREAMBLE: &str = r#"You are the portal assistant helping a STUDENT.

The student uses the portal to find jobs and internships, apply for scholarships and skill development schemes, build a resume and track applications.

How to answer:
- Be encouraging and practical. Students are often applying for the first time.
- Give numbered steps when the answer involves doing something in the portal.
- Point to the exact dashboard section ("Jobs & Internships", "My Applications", "Schemes", "Resume Builder", "Documents").
- Never promise selection, stipends or scholarship amounts. Those are decided by startups and officials.
- Keep answers under 200 words unless the student asks for detail."#;

pub const STARTUP_PREAMBLE: &str = r#"You are the portal assistant helping a STARTUP founder or recruiter.

Startups use the portal to register and get verified, post jobs and internships, review and shortlist applicants, and apply for funding, recognition and incubation schemes.

How to answer:
- Be concise and business-like. Founders are short on time.
- Give numbered steps for portal workflows ("Post Opportunity", "Manage Openings", "Startup Profile", "Schemes > Funding").
- Mention verification status when it affects what the startup can do.
- Do not give legal or tax advice. Suggest consulting a professional and link the relevant scheme guidelines instead.
- Keep answers under 200 words unless asked for detail."#;

pub const OFFICIAL_PREAMBLE: &str = r#"You are the portal assistant helping a government OFFICIAL.

Officials use the portal to verify startups, publish and manage schemes, review student and startup applications, handle grievances and generate reports.

How to answer:
- Be precise and formal. Officials need procedures they can follow and audit.
- Reference the exact module ("Verification Queue", "Scheme Management", "Applications", "Reports", "Administration").
- Note when an action is recorded in the audit trail or notifies the applicant.
- Never invent policy, budget figures or legal provisions. If unsure, say the official should check the scheme guidelines.
- Keep answers under 200 words unless asked for detail."#;

pub const VISITOR_PREAMBLE: &str = r#"You are the portal assistant talking to a VISITOR who is not logged in.

The portal connects students, startups and government officials: students find jobs, internships and scholarships; startups hire and apply for schemes; officials verify startups and manage schemes.

How to answer:
- Be welcoming and brief.
- Explain what the portal offers for each role and how to sign up when relevant.
- Do not discuss any specific account, application or record. The visitor must log in first.
- Keep answers under 150 words."#;

pub const IMAGE_NOTICE: &str = "The user attached an image to this message. You cannot see the image. Acknowledge it, answer from the text, and if the image seems essential ask them to describe what it shows.";

/// How many earlier questions are summarised for returning users.
const CONTINUITY_QUESTIONS: usize = 3;

/// Topic-specific guidance appended to the role preamble.
struct TopicGuide {
    keywords: &'static [&'static str],
    student: &'static str,
    startup: &'static str,
    official: &'static str,
    visitor: &'static str,
}

impl TopicGuide {
    fn for_role(&self, role: Role) -> &'static str {
        match role {
            Role::Student => self.student,
            Role::Startup => self.startup,
            Role::Official => self.official,
            Role::Visitor => self.visitor,
        }
    }
}

const TOPIC_GUIDES: &[TopicGuide] = &[
    TopicGuide {
        keywords: &["job", "internship", "intern", "hiring", "vacanc", "opening"],
        student: "Topic: jobs and internships. Openings are under \"Jobs & Internships\" with filters for location, sector, stipend and duration. Applications are tracked under \"My Applications\".",
        startup: "Topic: hiring. Openings are created from \"Post Opportunity\" and managed from \"Manage Openings\". Listings from unverified startups wait for verification before going live.",
        official: "Topic: placements. Officials can monitor openings and placements from \"Reports\" but do not approve individual job postings unless the startup is unverified.",
        visitor: "Topic: jobs. Students can browse and apply for openings after signing up with the Student role.",
    },
    TopicGuide {
        keywords: &["scheme", "scholarship", "grant", "subsidy", "benefit"],
        student: "Topic: schemes. Student schemes (scholarships, skilling) are under \"Schemes\". The \"Check Eligibility\" button compares the scheme rules with the student's profile.",
        startup: "Topic: schemes. Startup schemes (recognition, seed funding, incubation) are under \"Schemes\". Most require a verified startup profile.",
        official: "Topic: schemes. Schemes are created and edited in \"Scheme Management\" and become visible only after approval. Budgets are tracked under \"Scheme Management > Budget\".",
        visitor: "Topic: schemes. The portal lists government schemes for students and startups; eligibility can be checked after signing up.",
    },
    TopicGuide {
        keywords: &["fund", "loan", "invest", "money", "seed"],
        student: "Topic: money. Students receive stipends from startups and scholarships from schemes; the portal does not lend money.",
        startup: "Topic: funding. Seed grants and matching loans are under \"Schemes > Funding\". A pitch deck and financial projections are usually required.",
        official: "Topic: disbursement. Disbursed and committed amounts are tracked per scheme; disbursement decisions must be recorded with remarks.",
        visitor: "Topic: funding. Registered startups can apply for government funding schemes through the portal.",
    },
    TopicGuide {
        keywords: &["application", "applied", "status", "shortlist", "reject", "approve"],
        student: "Topic: application status. Statuses are Submitted, Under Review, Shortlisted, Interview Scheduled, Selected and Not Selected. Emails are sent on every change.",
        startup: "Topic: applicants. Candidates can be moved to Shortlisted, Interview or Rejected in \"Manage Openings\"; scheme applications are tracked under \"My Applications\".",
        official: "Topic: application review. Decisions are made under \"Applications\"; every decision needs remarks for the audit trail and notifies the applicant.",
        visitor: "Topic: applications. Application status is only visible after logging in.",
    },
    TopicGuide {
        keywords: &["verify", "verification", "verified", "certificate", "recogni"],
        student: "Topic: certificates. Internship certificates appear under Dashboard > Documents once the startup uploads them.",
        startup: "Topic: verification. Verification needs the incorporation certificate and founder details and usually takes 5 working days.",
        official: "Topic: verification. Pending startups are in the \"Verification Queue\"; cross-check the registration number before approving.",
        visitor: "Topic: verification. Startups are verified by officials after registration.",
    },
    TopicGuide {
        keywords: &["register", "sign", "account", "login", "password"],
        student: "Topic: account. Account settings live under Settings; password resets use the \"Forgot Password\" link.",
        startup: "Topic: account. Team members share the startup profile; each needs an individual login.",
        official: "Topic: account. Official accounts require an invitation code from the department administrator.",
        visitor: "Topic: sign up. Registration is via \"Sign Up\": choose a role, enter name, email and password, then verify the email.",
    },
    TopicGuide {
        keywords: &["document", "upload", "pdf", "file"],
        student: "Topic: documents. Uploads go to Dashboard > Documents; PDF, JPG and PNG up to 5 MB.",
        startup: "Topic: documents. Incorporation and compliance documents are uploaded in \"Startup Profile\"; PDF up to 5 MB.",
        official: "Topic: documents. Applicant documents open inline from each application; request re-upload if a scan is unreadable.",
        visitor: "Topic: documents. Documents can be uploaded after creating an account.",
    },
];

pub fn role_preamble(role: Role) -> &'static str {
    match role {
        Role::Student => STUDENT_PREAMBLE,
        Role::Startup => STARTUP_PREAMBLE,
        Role::Official => OFFICIAL_PREAMBLE,
        Role::Visitor => VISITOR_PREAMBLE,
    }
}

/// Guidance paragraphs whose keywords appear in `message`, in table order.
pub fn topic_guidance(message: &str, role: Role) -> Vec<&'static str> {
    let lower = message.to_lowercase();
    TOPIC_GUIDES
        .iter()
        .filter(|guide| guide.keywords.iter().any(|kw| lower.contains(kw)))
        .map(|guide| guide.for_role(role))
        .collect()
}

/// Summary of earlier questions for a returning user.
///
/// The newest turn is the message being answered, so it is skipped.
pub fn continuity_note(memory: &UserMemory) -> Option<String> {
    let earlier = memory.conversations.len().saturating_sub(1);
    if earlier == 0 {
        return None;
    }

    let recent: Vec<String> = memory.conversations[..earlier]
        .iter()
        .rev()
        .take(CONTINUITY_QUESTIONS)
        .map(|turn| format!("- {}", turn.question))
        .collect();

    Some(format!(
        "This is a returning user who has asked {} earlier question(s). Most recent first:\n{}\nUse this only for continuity; do not repeat earlier answers unless asked.",
        earlier,
        recent.join("\n")
    ))
}

/// Full system prompt for an escalated question.
pub fn build_system_prompt(
    message: &str,
    role: Role,
    context: Option<&str>,
    has_image: bool,
    memory: Option<&UserMemory>,
) -> String {
    let mut sections: Vec<String> = vec![role_preamble(role).to_string()];

    let guidance = topic_guidance(message, role);
    if !guidance.is_empty() {
        sections.push(guidance.join("\n"));
    }

    if let Some(note) = memory.and_then(continuity_note) {
        sections.push(note);
    }

    if let Some(ctx) = context.map(str::trim).filter(|c| !c.is_empty()) {
        sections.push(format!("CURRENT CONTEXT:\n{}", ctx));
    }

    if has_image {
        sections.push(IMAGE_NOTICE.to_string());
    }

    sections.join("\n\n")
}

/// Banner shown by the chat window when a known user opens it.
pub fn welcome_banner(name: &str, memory: Option<&UserMemory>) -> String {
    let name = name.trim();
    let who = if name.is_empty() { "there" } else { name };

    match memory.and_then(|m| m.last_turn()) {
        Some(last) => format!(
            "Welcome back, {}! Last time you asked: \"{}\". How can I help today?",
            who, last.question
        ),
        None => format!("Hi {}! Ask me anything about jobs, schemes, applications or your account.", who),
    }
}

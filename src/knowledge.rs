// Compiled-in knowledge base for the portal assistant.
// Keys are lowercase, space separated phrases; answers are returned verbatim.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Audience the current user is acting as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Startup,
    Official,
    Visitor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Startup => "startup",
            Role::Official => "official",
            Role::Visitor => "visitor",
        }
    }

    /// Unknown or empty roles are treated as an unauthenticated visitor.
    pub fn from_str(s: &str) -> Role {
        match s.trim().to_lowercase().as_str() {
            "student" => Role::Student,
            "startup" => Role::Startup,
            "official" => Role::Official,
            _ => Role::Visitor,
        }
    }

    pub fn partition(&self) -> Option<Partition> {
        match self {
            Role::Student => Some(Partition::Student),
            Role::Startup => Some(Partition::Startup),
            Role::Official => Some(Partition::Official),
            Role::Visitor => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Partition {
    General,
    Student,
    Startup,
    Official,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnowledgeEntry {
    pub key: &'static str,
    pub answer: &'static str,
}

const fn entry(key: &'static str, answer: &'static str) -> KnowledgeEntry {
    KnowledgeEntry { key, answer }
}

/// Immutable set of partitions searched by the intent matcher.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    general: Vec<KnowledgeEntry>,
    student: Vec<KnowledgeEntry>,
    startup: Vec<KnowledgeEntry>,
    official: Vec<KnowledgeEntry>,
}

static BUILTIN: Lazy<Arc<KnowledgeBase>> = Lazy::new(|| {
    Arc::new(KnowledgeBase {
        general: GENERAL_FAQ.to_vec(),
        student: STUDENT_FAQ.to_vec(),
        startup: STARTUP_FAQ.to_vec(),
        official: OFFICIAL_FAQ.to_vec(),
    })
});

impl KnowledgeBase {
    /// The compiled-in tables, built once per process.
    pub fn builtin() -> &'static KnowledgeBase {
        &BUILTIN
    }

    /// Shared handle to the compiled-in tables; every call returns the same allocation.
    pub fn shared() -> Arc<KnowledgeBase> {
        Arc::clone(&*BUILTIN)
    }

    pub fn from_partitions(
        general: Vec<KnowledgeEntry>,
        student: Vec<KnowledgeEntry>,
        startup: Vec<KnowledgeEntry>,
        official: Vec<KnowledgeEntry>,
    ) -> Self {
        Self { general, student, startup, official }
    }

    pub fn entries(&self, partition: Partition) -> &[KnowledgeEntry] {
        match partition {
            Partition::General => &self.general,
            Partition::Student => &self.student,
            Partition::Startup => &self.startup,
            Partition::Official => &self.official,
        }
    }

    /// Entries searched for `role`: role partition first, then general.
    pub fn search_order(&self, role: Role) -> impl Iterator<Item = &KnowledgeEntry> {
        let role_entries: &[KnowledgeEntry] = match role.partition() {
            Some(p) => self.entries(p),
            None => &[],
        };
        role_entries.iter().chain(self.general.iter())
    }

    pub fn len(&self) -> usize {
        self.general.len() + self.student.len() + self.startup.len() + self.official.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============ General ============

pub const GENERAL_FAQ: &[KnowledgeEntry] = &[
    entry(
        "who are you",
        "I'm the portal assistant. I can help students find jobs, internships and scholarships, help startups post openings and apply for schemes, and help officials review applications and verify startups. Ask me anything about using the portal.",
    ),
    entry(
        "how to register",
        "To register:\n1. Click \"Sign Up\" on the home page.\n2. Choose your role: Student, Startup or Official.\n3. Enter your name, email and a password of at least 8 characters.\n4. Verify your email using the link we send you.\n5. Log in and complete your profile so you get relevant recommendations.",
    ),
    entry(
        "create account",
        "Creating an account takes a minute: click \"Sign Up\", pick your role, fill in your name, email and password, then confirm your email address. Officials need an invitation code from their department administrator.",
    ),
    entry(
        "forgot password",
        "If you forgot your password, click \"Forgot Password\" on the login page and enter your registered email. You'll receive a reset link valid for 30 minutes. Check your spam folder if it doesn't arrive.",
    ),
    entry(
        "reset password",
        "To reset your password, open Settings > Security and choose \"Change Password\". If you can't log in, use the \"Forgot Password\" link on the login page instead.",
    ),
    entry(
        "login problem",
        "Having trouble logging in? Make sure you're using the email you registered with, check Caps Lock, and try resetting your password. If your account is locked after repeated attempts, wait 15 minutes or contact support.",
    ),
    entry(
        "which roles",
        "The portal has three roles:\n- Student: search and apply for jobs, internships and scholarships.\n- Startup: register your venture, post openings and apply for government schemes.\n- Official: verify startups, publish schemes and review applications.",
    ),
    entry(
        "update profile",
        "Go to your Dashboard and click \"Edit Profile\". You can change your contact details, skills, organisation information and profile photo. Remember to click \"Save\" before leaving the page.",
    ),
    entry(
        "notification settings",
        "You can manage notifications under Settings > Notifications. Choose whether to receive email alerts for new openings, application status changes and scheme deadlines.",
    ),
    entry(
        "contact support",
        "You can reach the support team through the \"Help\" section in the footer, or email support@portal.example. Officials can also raise tickets from their dashboard. Responses usually arrive within two working days.",
    ),
    entry(
        "privacy policy",
        "Your data is used only to match you with opportunities and process applications. We never sell personal information. The full privacy policy is linked in the footer of every page.",
    ),
    entry(
        "change language",
        "Use the language selector at the top right of any page to switch the interface language. Your choice is remembered for future visits.",
    ),
    entry(
        "upload documents",
        "Documents can be uploaded from Dashboard > Documents. Accepted formats are PDF, JPG and PNG up to 5 MB each. Make sure scans are clear and all pages are included.",
    ),
    entry(
        "delete account",
        "To delete your account, go to Settings > Account and choose \"Delete Account\". Pending applications will be withdrawn. This action cannot be undone.",
    ),
    entry(
        "give feedback",
        "We'd love to hear from you! Use the \"Feedback\" button at the bottom of the dashboard to share suggestions or report a problem.",
    ),
    entry(
        "hello",
        "Hello! How can I help you today? You can ask me about jobs, internships, schemes, applications or your account.",
    ),
    entry(
        "thank you",
        "You're welcome! Let me know if there's anything else I can help with.",
    ),
];

// ============ Student ============

pub const STUDENT_FAQ: &[KnowledgeEntry] = &[
    entry(
        "apply job internship",
        "To apply for a job or internship:\n1. Open \"Jobs & Internships\" from your dashboard.\n2. Use the filters (location, sector, stipend, duration) to narrow the list.\n3. Open a listing and read the eligibility criteria.\n4. Click \"Apply Now\" and attach your resume.\n5. Answer any screening questions and submit.\nYou can follow the status of every application under \"My Applications\".",
    ),
    entry(
        "track application status",
        "Open \"My Applications\" on your dashboard. Each application shows its current status: Submitted, Under Review, Shortlisted, Interview Scheduled, Selected or Not Selected. You'll also get an email whenever the status changes.",
    ),
    entry(
        "find scholarship",
        "Go to \"Schemes\" and filter by \"Scholarship\". Each scheme lists eligibility, required documents and deadlines. Click \"Check Eligibility\" to see if your profile qualifies before applying.",
    ),
    entry(
        "skill development program",
        "Skill development programs are listed under \"Schemes > Skilling\". They include short certification courses, apprenticeships and industry training. Most are free for registered students; seats are allotted on a first-come basis.",
    ),
    entry(
        "build resume",
        "Use the \"Resume Builder\" in your profile. Fill in education, skills, projects and experience, then download a PDF or attach it directly when applying. Keep it to one page and highlight projects relevant to the role.",
    ),
    entry(
        "withdraw application",
        "To withdraw an application, open \"My Applications\", select the application and click \"Withdraw\". You can withdraw only while the status is Submitted or Under Review.",
    ),
    entry(
        "interview preparation",
        "Prepare by researching the startup, revisiting the job description and practising answers about your projects. Interview slots appear under \"My Applications\" once you're shortlisted, along with the meeting link or venue.",
    ),
    entry(
        "eligibility criteria",
        "Eligibility is listed on every job, internship and scheme page. It typically covers your course, year of study, minimum marks and location. The \"Check Eligibility\" button compares these against your profile.",
    ),
    entry(
        "internship certificate",
        "Internship certificates are issued by the startup after completion. Once uploaded, they appear under Dashboard > Documents and can be downloaded or shared with a verification link.",
    ),
    entry(
        "recommended jobs",
        "Recommendations on your dashboard are based on your skills, course and preferred locations. Keep your profile updated to get better matches.",
    ),
    entry(
        "stipend payment",
        "Stipends are paid directly by the startup according to the terms in the internship listing. If a payment is delayed, first contact the startup; if unresolved, raise a grievance from \"Help\".",
    ),
];

// ============ Startup ============

pub const STARTUP_FAQ: &[KnowledgeEntry] = &[
    entry(
        "post job opening",
        "To post a job or internship:\n1. Open \"Post Opportunity\" on your dashboard.\n2. Choose Job or Internship and fill in the title, description, skills, location and compensation.\n3. Set the application deadline and number of positions.\n4. Submit for review. Listings from verified startups go live immediately; others go live after verification.",
    ),
    entry(
        "review applicants",
        "Open \"Manage Openings\" and select a listing to see all applicants. You can view resumes, filter by skills, and move candidates to Shortlisted, Interview or Rejected. Candidates are notified automatically.",
    ),
    entry(
        "startup registration",
        "To register your startup, complete the \"Startup Profile\" with your incorporation details, founders, sector and stage. Upload the certificate of incorporation. An official will verify the details, usually within 5 working days.",
    ),
    entry(
        "startup recognition",
        "Recognition requires a verified startup profile, incorporation less than 10 years ago and an innovative product or service. Apply from \"Schemes > Recognition\" and track the request under \"My Applications\".",
    ),
    entry(
        "funding scheme",
        "Funding schemes such as seed grants and matching loans are listed under \"Schemes > Funding\". Each scheme shows the maximum amount, eligibility and required documents. Prepare a pitch deck and financial projections before applying.",
    ),
    entry(
        "incubation support",
        "Incubation partners are listed under \"Resources > Incubators\". You can apply for workspace, mentoring and lab access. Verified startups get priority.",
    ),
    entry(
        "hire interns",
        "To hire interns, post an internship from \"Post Opportunity\", choosing duration and stipend. You can shortlist students, schedule interviews and issue offer letters from the same screen.",
    ),
    entry(
        "compliance requirements",
        "Startups must keep their profile and incorporation documents current, honour the stipend terms they publish and respond to grievances within 15 days. Repeated violations can lead to suspension of posting rights.",
    ),
    entry(
        "find mentor",
        "Browse mentors under \"Resources > Mentors\" by sector and expertise, then send a session request. Mentors usually reply within a week.",
    ),
    entry(
        "shortlist candidates",
        "In \"Manage Openings\", select applicants and click \"Shortlist\". You can then schedule interviews in bulk and send a common message to all shortlisted candidates.",
    ),
];

// ============ Official ============

pub const OFFICIAL_FAQ: &[KnowledgeEntry] = &[
    entry(
        "verify startup",
        "To verify a startup:\n1. Open \"Verification Queue\" on your dashboard.\n2. Select a pending startup and review its incorporation certificate and founder details.\n3. Cross-check the registration number with the registry.\n4. Approve, reject with a reason, or request more documents.\nThe startup is notified of your decision immediately.",
    ),
    entry(
        "publish scheme",
        "To publish a scheme, open \"Scheme Management\" and click \"New Scheme\". Enter the objective, eligibility, benefits, budget and deadline, attach guidelines, and submit for approval. Approved schemes become visible to the target audience.",
    ),
    entry(
        "approve scheme application",
        "Scheme applications appear under \"Applications > Schemes\". Open an application to review documents and eligibility, add remarks, then approve or reject. Bulk actions are available for applications that pass automated checks.",
    ),
    entry(
        "review applications",
        "The \"Applications\" section lists every application in your jurisdiction. Filter by scheme, status or date, open a record to see submitted documents, and record your decision with remarks for the audit trail.",
    ),
    entry(
        "generate report",
        "Open \"Reports\" and choose a template: scheme utilisation, applications by status, startup verification or placements. Select the date range and export as PDF or CSV.",
    ),
    entry(
        "analytics dashboard",
        "The analytics dashboard shows registrations, active openings, applications and scheme disbursements over time. Use the filters at the top to drill down by district, sector or scheme.",
    ),
    entry(
        "handle grievance",
        "Grievances are listed under \"Help > Grievances\". Assign each one to an officer, respond within 15 days and close it with a resolution note. Escalated grievances are flagged in red.",
    ),
    entry(
        "manage users",
        "Administrators can manage users from \"Administration > Users\": search accounts, reset access, suspend misuse and invite new officials with an invitation code.",
    ),
    entry(
        "audit trail",
        "Every approval, rejection and edit is recorded in the audit trail with the officer, timestamp and remarks. Open \"Administration > Audit Log\" to search or export it.",
    ),
    entry(
        "scheme budget",
        "Scheme budgets are tracked in \"Scheme Management > Budget\". You can see allocated, committed and disbursed amounts and set alerts when utilisation crosses a threshold.",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ALL: [Partition; 4] = [
        Partition::General,
        Partition::Student,
        Partition::Startup,
        Partition::Official,
    ];

    #[test]
    fn builtin_keys_are_normalized() {
        let kb = KnowledgeBase::builtin();
        for partition in ALL {
            for entry in kb.entries(partition) {
                assert_eq!(entry.key, entry.key.trim().to_lowercase(), "{:?} key {:?}", partition, entry.key);
                assert!(!entry.key.contains("  "), "{:?} key {:?} has doubled spaces", partition, entry.key);
                assert!(
                    entry.key.chars().all(|c| c == ' ' || !c.is_whitespace()),
                    "{:?} key {:?} has non-space whitespace",
                    partition,
                    entry.key
                );
                assert!(!entry.answer.trim().is_empty());
            }
        }
    }

    #[test]
    fn builtin_keys_are_unique_per_partition() {
        let kb = KnowledgeBase::builtin();
        for partition in ALL {
            let mut seen = HashSet::new();
            for entry in kb.entries(partition) {
                assert!(seen.insert(entry.key), "{:?} repeats key {:?}", partition, entry.key);
            }
            assert!(!seen.is_empty(), "{:?} is empty", partition);
        }
    }

    #[test]
    fn shared_tables_are_built_once() {
        let a = KnowledgeBase::shared();
        let b = KnowledgeBase::shared();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(std::ptr::eq(a.as_ref(), KnowledgeBase::builtin()));
    }

    #[test]
    fn visitor_searches_general_only() {
        let kb = KnowledgeBase::builtin();
        assert_eq!(kb.search_order(Role::Visitor).count(), kb.entries(Partition::General).len());
        assert_eq!(
            kb.search_order(Role::Student).next().map(|e| e.key),
            kb.entries(Partition::Student).first().map(|e| e.key)
        );
        assert_eq!(Role::from_str(" Startup "), Role::Startup);
        assert_eq!(Role::from_str("admin"), Role::Visitor);
    }
}

//! Built-in document corpus and TOML corpus loading.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::document::{Category, Document};
use crate::error::KnowledgeError;

/// On-disk corpus file layout: a list of `[[documents]]` tables.
#[derive(Debug, Deserialize)]
struct CorpusFile {
    #[serde(default)]
    documents: Vec<Document>,
}

/// Parse a TOML corpus file.
pub fn load_corpus(path: &Path) -> Result<Vec<Document>, KnowledgeError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| KnowledgeError::Io(format!("{}: {}", path.display(), e)))?;
    let documents = parse_corpus(&content)?;
    info!(
        path = %path.display(),
        documents = documents.len(),
        "Knowledge corpus loaded"
    );
    Ok(documents)
}

/// Parse corpus TOML from a string, rejecting duplicate ids.
pub fn parse_corpus(content: &str) -> Result<Vec<Document>, KnowledgeError> {
    let file: CorpusFile =
        toml::from_str(content).map_err(|e| KnowledgeError::Parse(e.to_string()))?;
    let mut seen = std::collections::HashSet::new();
    for doc in &file.documents {
        if !seen.insert(doc.id.as_str()) {
            return Err(KnowledgeError::DuplicateId(doc.id.clone()));
        }
    }
    Ok(file.documents)
}

fn doc(
    id: &str,
    title: &str,
    category: Category,
    keywords: &[&str],
    summary: &str,
    content: &str,
) -> Document {
    Document {
        id: id.to_string(),
        title: title.to_string(),
        category,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        summary: summary.to_string(),
        content: content.to_string(),
    }
}

/// Documents shipped with the service.
pub fn builtin_documents() -> Vec<Document> {
    vec![
        doc(
            "services-web",
            "Web development",
            Category::Services,
            &["website", "web development", "web app", "landing page", "frontend"],
            "We design and build fast, accessible websites and web applications.",
            "Our web development service covers marketing websites, landing pages and \
             complex web applications. Every build is responsive, accessible and \
             optimized for search engines, with a content management option so your \
             team can edit pages without touching code.",
        ),
        doc(
            "services-mobile",
            "Mobile apps",
            Category::Services,
            &["mobile app", "ios", "android", "flutter", "react native"],
            "We ship native-quality iOS and Android apps from a single codebase.",
            "For mobile projects we use React Native or Flutter to deliver iOS and \
             Android apps from one codebase. We handle app store submission, push \
             notifications, offline support and analytics.",
        ),
        doc(
            "services-ecommerce",
            "E-commerce",
            Category::Services,
            &["ecommerce", "e-commerce", "online store", "shopify", "stripe", "checkout"],
            "We build online stores that convert, from Shopify themes to custom checkouts.",
            "Our e-commerce work ranges from Shopify storefronts to fully custom stores \
             with Stripe payments, inventory sync and subscription billing. Conversion \
             optimization and analytics are part of every launch.",
        ),
        doc(
            "services-design",
            "UI/UX design and branding",
            Category::Services,
            &["design", "ui/ux", "branding", "logo", "figma"],
            "Our designers craft interfaces and brand identities that users remember.",
            "Design engagements start with user research and wireframes, then move to \
             high-fidelity Figma prototypes. Branding packages include logo, colour \
             palette, typography and a style guide.",
        ),
        doc(
            "services-seo",
            "SEO and growth",
            Category::Services,
            &["seo", "marketing", "search", "ranking", "analytics"],
            "We improve search rankings with technical SEO and content strategy.",
            "Our SEO service audits site speed, structured data and content gaps, then \
             delivers a prioritized plan. Monthly reports track rankings, traffic and \
             conversions.",
        ),
        doc(
            "tech-stack",
            "Technology stack",
            Category::Technologies,
            &["react", "next.js", "node.js", "typescript", "python", "rust", "postgresql"],
            "Our core stack is React, Next.js, Node.js and TypeScript, backed by PostgreSQL.",
            "We build frontends with React and Next.js in TypeScript. Backends run on \
             Node.js, Python or Rust depending on performance needs, with PostgreSQL as \
             the default database and GraphQL or REST APIs.",
        ),
        doc(
            "tech-cloud",
            "Cloud and DevOps",
            Category::Technologies,
            &["aws", "docker", "kubernetes", "hosting", "deployment", "devops"],
            "We deploy on AWS with Docker, automated pipelines and monitoring.",
            "Infrastructure is defined as code and deployed to AWS or your preferred \
             cloud. Docker images, continuous deployment and uptime monitoring are \
             standard; Kubernetes is available for larger platforms.",
        ),
        doc(
            "process-overview",
            "How we work",
            Category::Process,
            &["process", "timeline", "discovery", "sprint", "launch"],
            "Projects run in four phases: discovery, design, development and launch.",
            "Every engagement begins with a discovery workshop to agree scope and \
             success metrics. Design and development then run in two-week sprints with \
             a demo at the end of each, followed by testing, launch and a support period.",
        ),
        doc(
            "pricing-overview",
            "Pricing",
            Category::Pricing,
            &["price", "pricing", "cost", "budget", "quote", "estimate"],
            "Websites start at $5,000 and custom applications typically range from $20,000 to $80,000.",
            "Pricing depends on scope. Marketing websites start at $5,000, e-commerce \
             stores at $12,000 and custom web or mobile applications typically range from \
             $20,000 to $80,000. We provide a fixed quote after the discovery call.",
        ),
        doc(
            "portfolio-highlights",
            "Selected work",
            Category::Portfolio,
            &["portfolio", "case study", "clients", "examples", "projects"],
            "We have delivered over 120 projects for startups and established brands.",
            "Recent projects include a booking platform for a clinic chain, a Shopify \
             store that doubled conversion for a fashion label and a logistics \
             dashboard processing a million events a day.",
        ),
        doc(
            "company-about",
            "About us",
            Category::Company,
            &["team", "company", "about", "agency", "experience"],
            "We are a senior team of designers and engineers with ten years of experience.",
            "The studio was founded ten years ago and is made up of senior designers, \
             engineers and strategists. We work remotely across time zones and keep \
             each project team small and dedicated.",
        ),
        doc(
            "faq-timeline",
            "How long does a project take?",
            Category::Faq,
            &["how long", "timeline", "deadline", "weeks", "months", "urgent"],
            "Most websites launch in four to eight weeks; larger applications take three to six months.",
            "A marketing website usually takes four to eight weeks from kickoff. Custom \
             applications take three to six months. Urgent projects can be fast-tracked \
             with a larger team.",
        ),
        doc(
            "faq-support",
            "Do you offer support after launch?",
            Category::Faq,
            &["support", "maintenance", "after launch", "updates", "hosting"],
            "Every project includes 30 days of free support, with optional maintenance plans.",
            "After launch you get 30 days of free support. Maintenance plans cover \
             security updates, hosting, backups and small feature requests each month.",
        ),
    ]
}

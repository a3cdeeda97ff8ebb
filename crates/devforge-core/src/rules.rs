//! Built-in coding-rule templates matched against a plan's tech stack.

use crate::payload::{PromptPolicy, TechChoice};

pub struct RuleTemplate {
    pub tag: &'static str,
    pub label: &'static str,
    pub code_style: &'static [&'static str],
    pub architecture: &'static [&'static str],
    pub dos: &'static [&'static str],
    pub donts: &'static [&'static str],
}

impl RuleTemplate {
    pub fn to_policy(&self) -> PromptPolicy {
        let owned = |rules: &[&str]| rules.iter().map(|r| r.to_string()).collect();
        PromptPolicy {
            project_context: String::new(),
            code_style_rules: owned(self.code_style),
            architecture_rules: owned(self.architecture),
            dos: owned(self.dos),
            donts: owned(self.donts),
        }
    }
}

pub const TEMPLATES: &[RuleTemplate] = &[
    RuleTemplate {
        tag: "typescript",
        label: "TypeScript",
        code_style: &[
            "Use TypeScript strict mode; no implicit any",
            "Prefer interfaces over type aliases for object shapes",
            "Use explicit return types on exported functions",
            "Use const assertions for literal types",
        ],
        architecture: &[
            "Keep type definitions in dedicated types.ts files",
            "Use barrel exports (index.ts) for public module APIs",
        ],
        dos: &[
            "Use discriminated unions for state variants",
            "Validate data at system boundaries with Zod or similar",
        ],
        donts: &[
            "Never use @ts-ignore; use @ts-expect-error with an explanation if unavoidable",
            "Never use the any type; use unknown and narrow",
        ],
    },
    RuleTemplate {
        tag: "react",
        label: "React",
        code_style: &[
            "Use functional components exclusively",
            "Use named exports for components, not default exports",
            "Keep components under 150 lines; extract sub-components when larger",
            "Use destructured props in function signatures",
        ],
        architecture: &[
            "Place components in src/components/ organized by feature",
            "Colocate component-specific hooks, types and styles with the component",
            "Shared hooks go in src/hooks/",
            "Keep business logic out of components; use custom hooks",
        ],
        dos: &[
            "Use React.memo only when profiling shows a performance issue",
            "Use useCallback/useMemo for expensive computations, not every function",
            "Prefer controlled components for forms",
        ],
        donts: &[
            "Never mutate state directly; always create new objects and arrays",
            "Never use inline styles; use CSS modules or utility classes",
            "Avoid deeply nested ternaries in JSX",
        ],
    },
    RuleTemplate {
        tag: "vue",
        label: "Vue",
        code_style: &[
            "Use the Composition API with <script setup> syntax",
            "Use defineProps and defineEmits for component interfaces",
            "Prefix composables with \"use\" (useAuth, useCart)",
        ],
        architecture: &[
            "Place components in src/components/ organized by feature",
            "Place composables in src/composables/",
            "Use Pinia for global state management",
        ],
        dos: &[
            "Use computed properties for derived state",
            "Use v-model for two-way binding on form inputs",
        ],
        donts: &[
            "Never use the Options API in new code",
            "Avoid watchers when computed properties suffice",
        ],
    },
    RuleTemplate {
        tag: "nextjs",
        label: "Next.js",
        code_style: &[
            "Use the App Router (app/ directory) for all routes",
            "Mark client components explicitly with \"use client\"",
            "Prefer Server Components; only use Client Components for interactivity",
        ],
        architecture: &[
            "Use route groups for layout organization",
            "Place shared components in src/components/ and route-specific ones near their page",
            "Use server actions for form mutations",
            "Keep API routes in app/api/ for external-facing endpoints only",
        ],
        dos: &[
            "Use the Next.js Image component for optimized images",
            "Use dynamic imports for heavy client-side libraries",
        ],
        donts: &[
            "Never import server-only code in Client Components",
            "Avoid getServerSideProps/getStaticProps; use App Router data fetching",
        ],
    },
    RuleTemplate {
        tag: "node",
        label: "Node.js",
        code_style: &[
            "Use ES modules (import/export), not CommonJS",
            "Use async/await rather than raw promise chains or callbacks",
            "Handle errors explicitly; never swallow exceptions",
        ],
        architecture: &[
            "Separate route handlers, business logic and data access into distinct layers",
            "Use environment variables for all configuration; never hardcode secrets",
            "Place shared utilities in a lib/ or utils/ directory",
        ],
        dos: &[
            "Validate all external input (request bodies, query params, env vars)",
            "Use structured JSON logging in production",
        ],
        donts: &[
            "Never use synchronous file or network operations in request handlers",
            "Never commit .env files; keep a .env.example instead",
        ],
    },
    RuleTemplate {
        tag: "tailwind",
        label: "Tailwind CSS",
        code_style: &[
            "Use Tailwind utility classes; avoid custom CSS unless necessary",
            "Group classes logically: layout, spacing, typography, colors, effects",
            "Use @apply only in global styles for highly reused patterns",
        ],
        architecture: &[],
        dos: &[
            "Use responsive prefixes (sm:, md:, lg:) for responsive design",
            "Use a cn() or clsx() helper for conditional classes",
        ],
        donts: &[
            "Never use inline styles when a Tailwind class exists",
            "Avoid arbitrary values ([23px]); use the design system scale",
        ],
    },
    RuleTemplate {
        tag: "python",
        label: "Python",
        code_style: &[
            "Follow PEP 8; format with black and lint with ruff",
            "Use type hints on all function signatures",
            "Use f-strings for string formatting",
            "Use pathlib.Path instead of os.path",
        ],
        architecture: &[
            "Use a virtual environment (venv or poetry) for dependency isolation",
            "One responsibility per module",
        ],
        dos: &[
            "Use dataclasses or Pydantic models for structured data",
            "Use context managers for resource management",
        ],
        donts: &[
            "Never use mutable default arguments",
            "Never catch bare Exception; catch specific exception types",
        ],
    },
    RuleTemplate {
        tag: "prisma",
        label: "Prisma",
        code_style: &[],
        architecture: &[
            "Keep the Prisma schema in prisma/schema.prisma",
            "Use a single PrismaClient instance",
        ],
        dos: &[
            "Use Prisma migrations for schema changes; never modify the database directly",
            "Use select/include to fetch only needed fields",
        ],
        donts: &[
            "Never use raw SQL unless Prisma cannot express the query",
            "Never store the database URL in code; use environment variables",
        ],
    },
];

/// Templates whose tag occurs anywhere in the lower-cased
/// `"category choice"` text of the stack.
pub fn matching_templates(tech_stack: &[TechChoice]) -> Vec<&'static RuleTemplate> {
    let stack_text = tech_stack
        .iter()
        .map(|t| format!("{} {}", t.category, t.choice))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    TEMPLATES
        .iter()
        .filter(|tpl| stack_text.contains(tpl.tag))
        .collect()
}

/// Rules of every matching template merged in template order.
pub fn templates_for_stack(tech_stack: &[TechChoice]) -> PromptPolicy {
    let mut merged = PromptPolicy::default();
    for tpl in matching_templates(tech_stack) {
        merged.merge(&tpl.to_policy());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(category: &str, choice: &str) -> TechChoice {
        TechChoice {
            category: category.into(),
            choice: choice.into(),
            rationale: String::new(),
        }
    }

    #[test]
    fn tags_are_unique() {
        let mut tags: Vec<_> = TEMPLATES.iter().map(|t| t.tag).collect();
        tags.sort();
        tags.dedup();
        assert_eq!(tags.len(), TEMPLATES.len());
    }

    #[test]
    fn matches_case_insensitively() {
        let stack = [choice("Frontend", "React + TypeScript"), choice("CSS", "Tailwind")];
        let labels: Vec<_> = matching_templates(&stack).iter().map(|t| t.label).collect();
        assert_eq!(labels, vec!["TypeScript", "React", "Tailwind CSS"]);
    }

    #[test]
    fn category_text_also_matches() {
        let stack = [choice("Python backend", "FastAPI")];
        assert_eq!(matching_templates(&stack)[0].tag, "python");
    }

    #[test]
    fn merged_rules_concatenate_in_template_order() {
        let stack = [choice("Frontend", "Vue"), choice("Runtime", "Node")];
        let merged = templates_for_stack(&stack);
        assert_eq!(merged.code_style_rules[0], TEMPLATES[2].code_style[0]);
        assert_eq!(
            merged.dos.len(),
            TEMPLATES[2].dos.len() + TEMPLATES[4].dos.len()
        );
        assert!(merged.project_context.is_empty());
    }

    #[test]
    fn unknown_stack_yields_empty_policy() {
        assert!(templates_for_stack(&[choice("Lang", "Elixir")]).is_empty());
        assert!(templates_for_stack(&[]).is_empty());
    }
}

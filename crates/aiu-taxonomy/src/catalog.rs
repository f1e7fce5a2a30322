// catalog.rs — The built-in reference taxonomy.
//
// Four top-level sections, at most three levels deep. Ids are stable keys
// referenced by course override files and stored selections; renaming one
// orphans every stored reference to it.

use crate::tree::TaxonomyNode;

/// Node ids disallowed for every course unless a course explicitly allows them.
pub const BASELINE_DISALLOWED: &[&str] = &["full-section-generation", "full-solution-generation"];

/// The reference catalog definitions, in display order.
pub fn reference_nodes() -> Vec<TaxonomyNode> {
    use TaxonomyNode as N;

    vec![
        N::branch(
            "writing",
            "Writing",
            vec![
                N::branch(
                    "text-improvement",
                    "Text improvement",
                    vec![
                        N::leaf("text-correction", "Text correction (spelling, grammar)"),
                        N::leaf("style-rephrasing", "Rephrasing and style suggestions"),
                        N::leaf("translation", "Translation"),
                    ],
                ),
                N::branch(
                    "text-generation",
                    "Text generation",
                    vec![
                        N::leaf("outline-generation", "Outline and structure suggestions"),
                        N::leaf("paragraph-drafting", "Drafting individual paragraphs"),
                        N::leaf("full-section-generation", "Generating complete sections"),
                    ],
                ),
                N::leaf("source-summarization", "Summarizing sources"),
            ],
        ),
        N::branch(
            "programming",
            "Programming",
            vec![
                N::branch(
                    "code-generation",
                    "Code generation",
                    vec![
                        N::leaf("boilerplate-generation", "Boilerplate and scaffolding"),
                        N::leaf("test-generation", "Test generation"),
                        N::leaf("full-solution-generation", "Generating complete solutions"),
                    ],
                ),
                N::branch(
                    "code-understanding",
                    "Code understanding",
                    vec![
                        N::leaf("code-explanation", "Explaining existing code"),
                        N::leaf("debugging-support", "Debugging support"),
                    ],
                ),
                N::leaf("code-review", "Code review and refactoring suggestions"),
            ],
        ),
        N::branch(
            "research",
            "Research and learning",
            vec![
                N::leaf("concept-explanation", "Concept explanation"),
                N::leaf("literature-search", "Literature search"),
                N::leaf("brainstorming", "Brainstorming ideas"),
            ],
        ),
        N::branch(
            "data-analysis",
            "Data analysis",
            vec![
                N::leaf("data-cleaning", "Data cleaning"),
                N::leaf("statistical-analysis", "Statistical analysis"),
                N::leaf("visualization", "Visualization"),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Taxonomy;

    #[test]
    fn reference_catalog_has_unique_ids() {
        assert!(Taxonomy::from_nodes(reference_nodes()).is_ok());
    }

    #[test]
    fn baseline_ids_are_reference_leaves() {
        let tree = Taxonomy::reference();
        for id in BASELINE_DISALLOWED {
            assert!(tree.is_leaf(id), "{} should be a leaf", id);
        }
    }

    #[test]
    fn reference_depth_is_bounded() {
        let tree = Taxonomy::reference();
        for leaf in tree.leaves() {
            assert!(tree.path_to(&leaf).len() <= 4);
        }
    }

    #[test]
    fn writing_breadcrumb() {
        let tree = Taxonomy::reference();
        assert_eq!(
            tree.path_to("text-correction"),
            vec!["writing", "text-improvement", "text-correction"]
        );
    }
}

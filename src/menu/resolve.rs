//! Render-time walk over a compiled scope
//!
//! The walk is rerun from scratch whenever live state changes. Blocker
//! predicates are evaluated once per blocker per walk; a predicate that panics
//! is not caught.

use super::element::Element;

/// Visible elements of one walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Indices into the scope's element list, in declaration order
    pub visible: Vec<usize>,
    pub page_count: usize,
    /// Requested page, clamped to `1..=page_count`
    pub current_page: usize,
}

/// Number of pages needed for the paged items of `elements`
pub fn page_count(elements: &[Element]) -> usize {
    let Some(max) = max_items_per_page(elements) else {
        return 1;
    };
    let total = elements
        .iter()
        .filter(|e| matches!(e, Element::PagedItem))
        .count();
    total.div_ceil(max).max(1)
}

fn max_items_per_page(elements: &[Element]) -> Option<usize> {
    elements.iter().find_map(|e| match e {
        Element::PageSelector { max_items_per_page } => Some((*max_items_per_page).max(1)),
        _ => None,
    })
}

/// Walk `elements` for `current_page` (1-based)
pub fn resolve(elements: &[Element], current_page: usize) -> Resolution {
    let page_count = page_count(elements);
    let current_page = current_page.clamp(1, page_count);
    let max = max_items_per_page(elements).unwrap_or(usize::MAX);
    let start = (current_page - 1).saturating_mul(max);
    let end = start.saturating_add(max - 1);

    let mut visible = Vec::new();
    let mut blocking: Vec<bool> = Vec::new();
    let mut paged_index = 0usize;
    let mut out_of_window = false;

    for (i, element) in elements.iter().enumerate() {
        if out_of_window && !matches!(element, Element::PagedItemDone) {
            continue;
        }
        match element {
            Element::ConditionalBlocker { predicate } => {
                blocking.push(predicate());
                continue;
            }
            Element::ConditionalBlockerDone => {
                blocking.pop();
                continue;
            }
            Element::PagedItem => {
                out_of_window = paged_index < start || paged_index > end;
                paged_index += 1;
                continue;
            }
            Element::PagedItemDone => {
                out_of_window = false;
                continue;
            }
            _ => {}
        }
        if blocking.iter().any(|b| *b) {
            continue;
        }
        visible.push(i);
    }

    Resolution {
        visible,
        page_count,
        current_page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn label(text: &str) -> Element {
        Element::Label {
            text: text.to_string(),
        }
    }

    fn blocker(value: bool) -> Element {
        Element::ConditionalBlocker {
            predicate: Rc::new(move || value),
        }
    }

    fn texts(elements: &[Element], resolution: &Resolution) -> Vec<String> {
        resolution
            .visible
            .iter()
            .filter_map(|&i| match &elements[i] {
                Element::Label { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn paged(count: usize, max: usize) -> Vec<Element> {
        let mut elements = vec![Element::PageSelector {
            max_items_per_page: max,
        }];
        for i in 0..count {
            elements.push(Element::PagedItem);
            elements.push(label(&format!("item {}", i)));
            elements.push(Element::PagedItemDone);
        }
        elements.push(label("footer"));
        elements
    }

    #[test]
    fn test_unpaged_scope_shows_everything() {
        let elements = vec![label("a"), Element::Spacer, label("b")];
        let resolution = resolve(&elements, 1);
        assert_eq!(resolution.visible, vec![0, 1, 2]);
        assert_eq!(resolution.page_count, 1);
    }

    #[test]
    fn test_paging_windows() {
        let elements = paged(5, 2);
        let first = resolve(&elements, 1);
        assert_eq!(first.page_count, 3);
        assert_eq!(texts(&elements, &first), vec!["item 0", "item 1", "footer"]);
        assert!(first.visible.contains(&0));

        let last = resolve(&elements, 3);
        assert_eq!(texts(&elements, &last), vec!["item 4", "footer"]);
    }

    #[test]
    fn test_page_is_clamped() {
        let elements = paged(3, 2);
        assert_eq!(resolve(&elements, 0).current_page, 1);
        assert_eq!(resolve(&elements, 9).current_page, 2);
        assert_eq!(page_count(&paged(0, 4)), 1);
    }

    #[test]
    fn test_true_blocker_hides_region() {
        let elements = vec![
            label("before"),
            blocker(true),
            label("hidden"),
            blocker(false),
            label("still hidden"),
            Element::ConditionalBlockerDone,
            Element::ConditionalBlockerDone,
            label("after"),
        ];
        let resolution = resolve(&elements, 1);
        assert_eq!(texts(&elements, &resolution), vec!["before", "after"]);
    }

    #[test]
    fn test_predicate_runs_once_per_walk() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let elements = vec![
            Element::ConditionalBlocker {
                predicate: Rc::new(move || {
                    counter.set(counter.get() + 1);
                    false
                }),
            },
            label("a"),
            label("b"),
            Element::ConditionalBlockerDone,
        ];
        resolve(&elements, 1);
        assert_eq!(calls.get(), 1);
        resolve(&elements, 1);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_blocked_paged_items_still_count() {
        let mut elements = vec![Element::PageSelector {
            max_items_per_page: 1,
        }];
        elements.push(blocker(true));
        elements.push(Element::PagedItem);
        elements.push(label("blocked"));
        elements.push(Element::PagedItemDone);
        elements.push(Element::ConditionalBlockerDone);
        elements.push(Element::PagedItem);
        elements.push(label("second"));
        elements.push(Element::PagedItemDone);

        let first = resolve(&elements, 1);
        assert_eq!(first.page_count, 2);
        assert!(texts(&elements, &first).is_empty());
        let second = resolve(&elements, 2);
        assert_eq!(texts(&elements, &second), vec!["second"]);
    }

    #[test]
    #[should_panic(expected = "predicate failed")]
    fn test_panicking_predicate_propagates() {
        let elements = vec![
            Element::ConditionalBlocker {
                predicate: Rc::new(|| -> bool { panic!("predicate failed") }),
            },
            Element::ConditionalBlockerDone,
        ];
        resolve(&elements, 1);
    }
}

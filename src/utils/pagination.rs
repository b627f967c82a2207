use serde::{ser::SerializeStruct, Serialize, Serializer};

/// Splits `count` ordered items into pages of `per_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: usize,
    per_page: usize,
}

/// The slice of the collection backing one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub offset: usize,
    pub limit: usize,
}

impl Paginator {
    pub fn new(count: usize, per_page: usize) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    /// Never below 1, an empty collection still has one (empty) page.
    pub fn num_pages(&self) -> usize {
        self.count.div_ceil(self.per_page).max(1)
    }

    /// Resolves a raw `?page=` value. Missing or non-numeric input means the
    /// first page, anything out of range means the last one.
    pub fn window(&self, requested: Option<&str>) -> PageWindow {
        let last = self.num_pages();
        let number = match requested.map(str::trim).map(str::parse::<i64>) {
            None | Some(Err(_)) => 1,
            Some(Ok(n)) if n < 1 || n as u64 > last as u64 => last,
            Some(Ok(n)) => n as usize,
        };

        let offset = (number - 1) * self.per_page;
        let limit = self.per_page.min(self.count.saturating_sub(offset));

        PageWindow {
            number,
            offset,
            limit,
        }
    }

    pub fn page<T>(&self, window: PageWindow, objects: Vec<T>) -> Page<T> {
        Page {
            objects,
            number: window.number,
            num_pages: self.num_pages(),
            count: self.count,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub objects: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub per_page: usize,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_page_number(&self) -> Option<usize> {
        self.has_next().then_some(self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<usize> {
        self.has_previous().then(|| self.number - 1)
    }

    /// 1-based index of the first object on the page, 0 for an empty page.
    pub fn start_index(&self) -> usize {
        if self.count == 0 {
            return 0;
        }
        (self.number - 1) * self.per_page + 1
    }

    pub fn end_index(&self) -> usize {
        if self.number == self.num_pages {
            return self.count;
        }
        self.number * self.per_page
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            objects: self.objects.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            per_page: self.per_page,
        }
    }
}

impl<T: Serialize> Serialize for Page<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Page", 10)?;
        state.serialize_field("objects", &self.objects)?;
        state.serialize_field("number", &self.number)?;
        state.serialize_field("num_pages", &self.num_pages)?;
        state.serialize_field("count", &self.count)?;
        state.serialize_field("has_next", &self.has_next())?;
        state.serialize_field("has_previous", &self.has_previous())?;
        state.serialize_field("next_page_number", &self.next_page_number())?;
        state.serialize_field("previous_page_number", &self.previous_page_number())?;
        state.serialize_field("start_index", &self.start_index())?;
        state.serialize_field("end_index", &self.end_index())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn page_of(count: usize, per_page: usize, requested: Option<&str>) -> Page<usize> {
        let paginator = Paginator::new(count, per_page);
        let window = paginator.window(requested);
        let objects = (window.offset..window.offset + window.limit).collect();
        paginator.page(window, objects)
    }

    #[test]
    fn thirteen_items_split_ten_and_three() {
        let first = page_of(13, 10, None);
        assert_eq!(first.len(), 10);
        assert!(first.has_next());

        let second = page_of(13, 10, Some("2"));
        assert_eq!(second.len(), 3);
        assert_eq!(second.objects, vec![10, 11, 12]);
        assert!(!second.has_next());
        assert_eq!(second.previous_page_number(), Some(1));
    }

    #[test]
    fn beyond_last_page_returns_last_page() {
        let page = page_of(13, 10, Some("99"));
        assert_eq!(page.number, 2);
        assert_eq!(page.len(), 3);
    }

    #[test]
    fn non_positive_page_returns_last_page() {
        assert_eq!(page_of(25, 10, Some("0")).number, 3);
        assert_eq!(page_of(25, 10, Some("-4")).number, 3);
    }

    #[test]
    fn garbage_page_returns_first_page() {
        assert_eq!(page_of(25, 10, Some("abc")).number, 1);
        assert_eq!(page_of(25, 10, Some("")).number, 1);
    }

    #[test]
    fn empty_collection_has_one_empty_page() {
        let page = page_of(0, 10, Some("3"));
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(page.is_empty());
        assert_eq!(page.start_index(), 0);
        assert_eq!(page.end_index(), 0);
    }

    #[test]
    fn indices_are_one_based() {
        let page = page_of(13, 10, Some("2"));
        assert_eq!(page.start_index(), 11);
        assert_eq!(page.end_index(), 13);
    }

    #[test]
    fn serialized_page_carries_navigation_and_indices() {
        let json = serde_json::to_value(page_of(13, 10, Some("2"))).unwrap();

        assert_eq!(json["number"], 2);
        assert_eq!(json["next_page_number"], serde_json::Value::Null);
        assert_eq!(json["previous_page_number"], 1);
        assert_eq!(json["start_index"], 11);
        assert_eq!(json["end_index"], 13);
    }

    proptest! {
        #[test]
        fn page_counts_match_ceiling_division(count in 1usize..500, per_page in 1usize..50) {
            let paginator = Paginator::new(count, per_page);
            let expected_pages = count.div_ceil(per_page);
            prop_assert_eq!(paginator.num_pages(), expected_pages);

            let last = page_of(count, per_page, Some(&expected_pages.to_string()));
            let expected_last = if count % per_page == 0 { per_page } else { count % per_page };
            prop_assert_eq!(last.len(), expected_last);

            let total: usize = (1..=expected_pages)
                .map(|n| page_of(count, per_page, Some(&n.to_string())).len())
                .sum();
            prop_assert_eq!(total, count);
        }
    }
}

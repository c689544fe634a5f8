//! Filtered and sorted list view-model.
//!
//! A [`ListView`] holds two lists of the same rows: `source`, everything loaded from the store, and `view`, the rows
//! that pass the current filter in the current sort order. Rows are shared between both lists as [`Arc`]s, so a
//! refresh never copies a record and a binding holding an `Arc` keeps seeing the same row.
//!
//! All persistence goes through the [`RecordStore`]. When a store call fails, neither list is modified.
use std::fmt::Debug;
use std::sync::Arc;

use tracing::debug;
use tracing::instrument;
use tracing::warn;

use crate::store::Listed;
use crate::store::RecordStore;
use crate::store::SortKey;
use crate::types::DeskError;
use crate::types::Result;

type Rec<S> = <S as RecordStore>::Record;
type SortOf<S> = <Rec<S> as Listed>::Sort;

pub struct ListView<S: RecordStore> {
    store:  S,
    source: Vec<Arc<Rec<S>>>,
    view:   Vec<Arc<Rec<S>>>,
    filter: String,
    sort:   SortOf<S>,
}

impl<S: RecordStore> ListView<S> {
    /// Load all rows from `store`. The view starts unfiltered, in default order.
    #[instrument(level = "debug", skip(store), fields(entity = <Rec<S> as Listed>::ENTITY))]
    pub async fn open(store: S) -> Result<Self> {
        let mut lv = Self {
            store,
            source: Vec::new(),
            view: Vec::new(),
            filter: String::new(),
            sort: <SortOf<S> as Default>::default(),
        };
        lv.reload().await?;
        Ok(lv)
    }

    /// Re-read the table, keeping the current filter and sort.
    pub async fn reload(&mut self) -> Result<()> {
        let mut rows = self.store.list_all().await?.into_iter().map(Arc::new).collect::<Vec<_>>();
        rows.sort_by(Self::ordering(<SortOf<S> as Default>::default()));
        debug!("Loaded {} {} row(s)", rows.len(), <Rec<S> as Listed>::ENTITY);
        self.source = rows;
        self.apply();
        Ok(())
    }

    /// Set filter text and sort order, then rebuild the view.
    ///
    /// The filter matches case-insensitively against the record's searchable fields; an empty filter matches all rows.
    pub fn refresh(&mut self, filter: &str, sort: SortOf<S>) {
        self.filter = filter.to_string();
        self.sort = sort;
        self.apply();
    }

    /// Like [`refresh`](Self::refresh) with the sort given by name. Unknown names select the default order.
    pub fn refresh_by_name(&mut self, filter: &str, sort: &str) {
        self.refresh(filter, <SortOf<S> as SortKey<Rec<S>>>::parse_or_default(sort));
    }

    /// Like [`refresh`](Self::refresh) with the sort given by its position among the options.
    pub fn refresh_by_index(&mut self, filter: &str, index: usize) {
        self.refresh(filter, <SortOf<S> as SortKey<Rec<S>>>::index_or_default(index));
    }

    /// Clear the filter and return to the default order.
    pub fn reset(&mut self) {
        self.refresh("", <SortOf<S> as Default>::default());
    }

    /// Validate and persist a new row, then show it according to the current criteria.
    #[instrument(level = "debug", skip(self, form), fields(entity = <Rec<S> as Listed>::ENTITY))]
    pub async fn create(&mut self, form: &S::Form) -> Result<Arc<Rec<S>>> {
        let record = Arc::new(
            self.store
                .insert(form)
                .await
                .inspect_err(|e| Self::rejected("create", e))?,
        );
        self.source.push(record.clone());
        self.apply();
        Ok(record)
    }

    /// Validate and persist changes to row `id`, replacing its entry in both lists.
    #[instrument(level = "debug", skip(self, form), fields(entity = <Rec<S> as Listed>::ENTITY))]
    pub async fn update(&mut self, id: i32, form: &S::Form) -> Result<Arc<Rec<S>>> {
        let pos = self.position(id)?;
        let record = Arc::new(
            self.store
                .update(id, form)
                .await
                .inspect_err(|e| Self::rejected("update", e))?,
        );
        self.source[pos] = record.clone();
        self.apply();
        Ok(record)
    }

    /// Delete row `id`. Rows that others depend on are kept and a [`DeskError::Conflict`] is returned.
    #[instrument(level = "debug", skip(self), fields(entity = <Rec<S> as Listed>::ENTITY))]
    pub async fn delete(&mut self, id: i32) -> Result<()> {
        let pos = self.position(id)?;
        self.store
            .delete(id)
            .await
            .inspect_err(|e| Self::rejected("delete", e))?;
        self.source.remove(pos);
        self.view.retain(|r| r.id() != id);
        Ok(())
    }

    pub fn find(&self, id: i32) -> Option<&Arc<Rec<S>>> {
        self.source.iter().find(|r| r.id() == id)
    }

    pub fn source(&self) -> &[Arc<Rec<S>>] {
        &self.source
    }

    /// Rows as they should be displayed.
    pub fn view(&self) -> &[Arc<Rec<S>>] {
        &self.view
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn sort(&self) -> SortOf<S> {
        self.sort
    }

    fn apply(&mut self) {
        let needle = self.filter.to_lowercase();
        self.view.clear();
        self.view
            .extend(self.source.iter().filter(|r| r.matches(&needle)).cloned());
        self.view.sort_by(Self::ordering(self.sort));
    }

    // Ties are broken by ID so the order is deterministic.
    fn ordering(sort: SortOf<S>) -> impl Fn(&Arc<Rec<S>>, &Arc<Rec<S>>) -> std::cmp::Ordering {
        let cmp = sort.comparator();
        move |a, b| cmp(a, b).then_with(|| a.id().cmp(&b.id()))
    }

    fn position(&self, id: i32) -> Result<usize> {
        self.source
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| DeskError::not_found(<Rec<S> as Listed>::ENTITY, id))
    }

    fn rejected(action: &str, err: &DeskError) {
        if err.is_rejection() {
            warn!("Cannot {action} {}: {err}", <Rec<S> as Listed>::ENTITY);
        }
    }
}

impl<S: RecordStore> Debug for ListView<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListView")
            .field("entity", &<Rec<S> as Listed>::ENTITY)
            .field("source", &self.source.len())
            .field("view", &self.view.len())
            .field("filter", &self.filter)
            .field("sort", &self.sort)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::db::entity::Customer;
    use crate::db::entity::CustomerForm;
    use crate::db::entity::CustomerSort;
    use crate::store::Form;

    /// Customer table kept in memory.
    #[derive(Debug, Default)]
    struct MemStore {
        rows:    Mutex<Vec<Customer>>,
        next_id: Mutex<i32>,
        /// IDs that behave as if they had dependent rows.
        pinned:  Vec<i32>,
    }

    impl MemStore {
        fn with(names: &[(&str, &str)]) -> Self {
            let store = Self::default();
            for (last, first) in names {
                store.push(first, last);
            }
            store
        }

        fn push(&self, first: &str, last: &str) -> Customer {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let c = Customer {
                id:         *next_id,
                first_name: first.into(),
                last_name:  last.into(),
                email:      format!("{}@example.com", first.to_lowercase()),
                phone:      "555".into(),
            };
            self.rows.lock().unwrap().push(c.clone());
            c
        }
    }

    #[async_trait]
    impl RecordStore for MemStore {
        type Form = CustomerForm;
        type Record = Customer;

        async fn list_all(&self) -> Result<Vec<Customer>> {
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn get_by_id(&self, id: i32) -> Result<Option<Customer>> {
            Ok(self.rows.lock().unwrap().iter().find(|c| c.id == id).cloned())
        }

        async fn insert(&self, form: &CustomerForm) -> Result<Customer> {
            form.check()?;
            Ok(self.push(&form.first_name, &form.last_name))
        }

        async fn update(&self, id: i32, form: &CustomerForm) -> Result<Customer> {
            form.check()?;
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or(DeskError::not_found("customer", id))?;
            row.first_name = form.first_name.clone();
            row.last_name = form.last_name.clone();
            Ok(row.clone())
        }

        async fn delete(&self, id: i32) -> Result<()> {
            if self.pinned.contains(&id) {
                return Err(DeskError::conflict("has orders"));
            }
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|c| c.id != id);
            if rows.len() == before {
                return Err(DeskError::not_found("customer", id));
            }
            Ok(())
        }
    }

    fn last_names(lv: &ListView<MemStore>) -> Vec<&str> {
        lv.view().iter().map(|c| c.last_name.as_str()).collect()
    }

    fn form(first: &str, last: &str) -> CustomerForm {
        CustomerForm {
            first_name: first.into(),
            last_name:  last.into(),
            email:      "x@example.com".into(),
            phone:      "555".into(),
        }
    }

    #[tokio::test]
    async fn test_open_sorts_by_default_key() {
        let lv = ListView::open(MemStore::with(&[("Sidorov", "Sidor"), ("Ivanov", "Ivan"), ("Petrov", "Petr")]))
            .await
            .unwrap();
        assert_eq!(last_names(&lv), ["Ivanov", "Petrov", "Sidorov"]);
        assert_eq!(lv.source().len(), 3);
        assert_eq!(lv.sort(), CustomerSort::Unsorted);
        assert_eq!(lv.filter(), "");
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent_and_shares_rows() {
        let mut lv = ListView::open(MemStore::with(&[("Petrov", "Petr"), ("Ivanov", "Ivan")]))
            .await
            .unwrap();
        let first = lv.view()[0].clone();
        lv.refresh("", CustomerSort::default());
        let once = last_names(&lv).join(",");
        lv.refresh("", CustomerSort::default());
        assert_eq!(last_names(&lv).join(","), once);
        assert!(Arc::ptr_eq(&first, &lv.view()[0]));
        assert!(lv.source().iter().any(|r| Arc::ptr_eq(r, &first)));
    }

    #[tokio::test]
    async fn test_filter_and_sort() {
        let mut lv = ListView::open(MemStore::with(&[("Ivanov", "Ivan"), ("Petrov", "Petr"), ("Smirnova", "Anna")]))
            .await
            .unwrap();

        lv.refresh("SMIR", CustomerSort::LastNameAsc);
        assert_eq!(last_names(&lv), ["Smirnova"]);

        lv.refresh("ov", CustomerSort::LastNameAsc);
        let asc = last_names(&lv).into_iter().map(String::from).collect::<Vec<_>>();
        lv.refresh("ov", CustomerSort::LastNameDesc);
        let mut desc = last_names(&lv).into_iter().map(String::from).collect::<Vec<_>>();
        desc.reverse();
        assert_eq!(asc, desc);

        lv.refresh("nobody", CustomerSort::LastNameAsc);
        assert!(lv.view().is_empty());

        lv.refresh_by_name("", "shoe-size");
        assert_eq!(lv.sort(), CustomerSort::Unsorted);
        assert_eq!(last_names(&lv), ["Ivanov", "Petrov", "Smirnova"]);

        lv.refresh_by_index("an", 3);
        assert_eq!(lv.sort(), CustomerSort::FirstNameAsc);
        assert_eq!(last_names(&lv), ["Smirnova", "Ivanov"]);

        lv.reset();
        assert_eq!(lv.view().len(), 3);
    }

    #[tokio::test]
    async fn test_ties_broken_by_id() {
        let mut lv = ListView::open(MemStore::with(&[("Ivanov", "Petr"), ("Ivanov", "Petr"), ("Ivanov", "Petr")]))
            .await
            .unwrap();
        lv.refresh("", CustomerSort::LastNameDesc);
        let ids = lv.view().iter().map(|c| c.id).collect::<Vec<_>>();
        assert_eq!(ids, [1, 2, 3]);
    }

    #[tokio::test]
    async fn test_create_keeps_criteria() {
        let mut lv = ListView::open(MemStore::with(&[("Ivanov", "Ivan")])).await.unwrap();
        lv.refresh("petr", CustomerSort::LastNameAsc);
        assert!(lv.view().is_empty());

        let created = lv.create(&form("Petr", "Petrov")).await.unwrap();
        assert_eq!(lv.source().len(), 2);
        assert_eq!(lv.view().len(), 1);
        assert!(Arc::ptr_eq(&lv.view()[0], &created));

        let err = lv.create(&form("", "Nobody")).await.unwrap_err();
        assert!(matches!(err, DeskError::Validation(_)));
        assert_eq!(lv.source().len(), 2);
        assert_eq!(lv.view().len(), 1);
    }

    #[tokio::test]
    async fn test_update() {
        let mut lv = ListView::open(MemStore::with(&[("Ivanov", "Ivan"), ("Petrov", "Petr")]))
            .await
            .unwrap();

        let updated = lv.update(1, &form("Ivan", "Zaitsev")).await.unwrap();
        assert_eq!(updated.last_name, "Zaitsev");
        assert_eq!(last_names(&lv), ["Petrov", "Zaitsev"]);
        assert!(Arc::ptr_eq(lv.find(1).unwrap(), &updated));

        assert!(matches!(
            lv.update(42, &form("Ivan", "Ivanov")).await,
            Err(DeskError::NotFound { id: 42, .. })
        ));
        assert!(matches!(
            lv.update(2, &form("Petr", " ")).await,
            Err(DeskError::Validation(_))
        ));
        assert_eq!(lv.find(2).unwrap().last_name, "Petrov");
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemStore {
            pinned: vec![2],
            ..MemStore::with(&[("Ivanov", "Ivan"), ("Petrov", "Petr")])
        };
        let mut lv = ListView::open(store).await.unwrap();

        assert!(matches!(lv.delete(2).await, Err(DeskError::Conflict(_))));
        assert_eq!(lv.view().len(), 2);

        lv.delete(1).await.unwrap();
        assert_eq!(last_names(&lv), ["Petrov"]);
        assert!(lv.find(1).is_none());

        assert!(matches!(lv.delete(1).await, Err(DeskError::NotFound { .. })));
    }
}

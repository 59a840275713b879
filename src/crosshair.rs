// Linked crosshair across a group of charts

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;

use crate::dataset::{nearest_date_index, Dataset};
use crate::error::PlotError;
use crate::ir::{ChartId, ChartSpec, GroupId};

/// Hover state shared by every member of one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrosshairState {
    /// No pointer over any member chart.
    Idle,
    /// Pointer over `source`; every member shows the crosshair at `date`,
    /// which is always a date present in the data (row `index`).
    Tracking {
        source: ChartId,
        index: usize,
        date: NaiveDateTime,
    },
}

/// Result of linking a set of charts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupHandle {
    pub group: GroupId,
    pub members: Vec<ChartId>,
}

/// Broadcast produced by a pointer move: every member repositions to `date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrosshairUpdate {
    pub group: GroupId,
    pub index: usize,
    pub date: NaiveDateTime,
    pub members: Vec<ChartId>,
}

#[derive(Debug)]
struct Group {
    members: Vec<ChartId>,
    dates: Vec<NaiveDateTime>,
    state: CrosshairState,
}

/// Owns crosshair group membership. Charts only carry a `GroupId`; they
/// never reference their siblings. Groups are disjoint.
#[derive(Debug, Default)]
pub struct CrosshairCoordinator {
    next_group: u64,
    groups: IndexMap<GroupId, Group>,
    membership: HashMap<ChartId, GroupId>,
}

impl CrosshairCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh group id to build charts with.
    pub fn create_group(&mut self) -> GroupId {
        let id = GroupId(self.next_group);
        self.next_group += 1;
        id
    }

    /// Bind `charts` into the group they were built for. Linking the same
    /// group again replaces its membership, and any chart that belonged to
    /// another group is detached from it first.
    pub fn link_group(
        &mut self,
        charts: &[ChartSpec],
        dataset: &Dataset,
    ) -> Result<GroupHandle, PlotError> {
        let group = charts.first().ok_or(PlotError::EmptyGroup)?.group;
        if charts.iter().any(|c| c.group != group) {
            return Err(PlotError::GroupMismatch);
        }

        // Drop the previous membership of this group
        if let Some(old) = self.groups.shift_remove(&group) {
            for id in old.members {
                self.membership.remove(&id);
            }
        }

        let members: Vec<ChartId> = charts.iter().map(|c| c.id).collect();
        for &id in &members {
            self.detach(id);
            self.membership.insert(id, group);
        }

        self.groups.insert(
            group,
            Group {
                members: members.clone(),
                dates: dataset.dates().to_vec(),
                state: CrosshairState::Idle,
            },
        );
        debug!(%group, members = members.len(), "linked crosshair group");

        Ok(GroupHandle { group, members })
    }

    /// Remove a chart from whatever group it is in. Empty groups are dropped.
    pub fn detach(&mut self, chart: ChartId) {
        let Some(group) = self.membership.remove(&chart) else {
            return;
        };
        let now_empty = match self.groups.get_mut(&group) {
            Some(g) => {
                g.members.retain(|&m| m != chart);
                if matches!(g.state, CrosshairState::Tracking { source, .. } if source == chart) {
                    g.state = CrosshairState::Idle;
                }
                g.members.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.groups.shift_remove(&group);
        }
    }

    /// Pointer over `chart` at `at`. Snaps to the nearest sampled date and
    /// broadcasts it to every member of the chart's group.
    pub fn pointer_moved(
        &mut self,
        chart: ChartId,
        at: NaiveDateTime,
    ) -> Result<CrosshairUpdate, PlotError> {
        let group_id = *self.membership.get(&chart).ok_or(PlotError::UnknownChart)?;
        let group = self
            .groups
            .get_mut(&group_id)
            .ok_or(PlotError::UnknownChart)?;

        let index = nearest_date_index(&group.dates, at);
        let date = group.dates[index];
        group.state = CrosshairState::Tracking {
            source: chart,
            index,
            date,
        };

        Ok(CrosshairUpdate {
            group: group_id,
            index,
            date,
            members: group.members.clone(),
        })
    }

    /// Pointer left `chart`. The group goes idle unless the pointer has
    /// already moved on to a sibling.
    pub fn pointer_left(&mut self, chart: ChartId) -> Result<CrosshairState, PlotError> {
        let group_id = *self.membership.get(&chart).ok_or(PlotError::UnknownChart)?;
        let group = self
            .groups
            .get_mut(&group_id)
            .ok_or(PlotError::UnknownChart)?;

        if matches!(group.state, CrosshairState::Tracking { source, .. } if source == chart) {
            group.state = CrosshairState::Idle;
        }
        Ok(group.state)
    }

    pub fn group_of(&self, chart: ChartId) -> Option<GroupId> {
        self.membership.get(&chart).copied()
    }

    pub fn members(&self, group: GroupId) -> &[ChartId] {
        self.groups
            .get(&group)
            .map(|g| g.members.as_slice())
            .unwrap_or(&[])
    }

    pub fn state(&self, group: GroupId) -> Option<CrosshairState> {
        self.groups.get(&group).map(|g| g.state)
    }

    /// The crosshair row `chart` currently shows, if any.
    pub fn active_index(&self, chart: ChartId) -> Option<usize> {
        let group = self.membership.get(&chart)?;
        match self.groups.get(group)?.state {
            CrosshairState::Tracking { index, .. } => Some(index),
            CrosshairState::Idle => None,
        }
    }

    /// The crosshair date `chart` currently shows, if any.
    pub fn active_date(&self, chart: ChartId) -> Option<NaiveDateTime> {
        let group = self.membership.get(&chart)?;
        match self.groups.get(group)?.state {
            CrosshairState::Tracking { date, .. } => Some(date),
            CrosshairState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::build_chart_from_names;
    use chrono::{Duration, NaiveDate};

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn make_dataset() -> Dataset {
        let mut columns = IndexMap::new();
        columns.insert("A".to_string(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        columns.insert("B".to_string(), vec![5.0, 4.0, 3.0, 2.0, 1.0]);
        Dataset::new((1..=5).map(day).collect(), columns).unwrap()
    }

    fn chart(data: &Dataset, group: GroupId) -> ChartSpec {
        build_chart_from_names(None, data, &["A"], &["B"], group).unwrap()
    }

    #[test]
    fn test_hover_broadcasts_to_siblings() {
        let data = make_dataset();
        let mut coord = CrosshairCoordinator::new();
        let g = coord.create_group();
        let c1 = chart(&data, g);
        let c2 = chart(&data, g);
        let handle = coord.link_group(&[c1.clone(), c2.clone()], &data).unwrap();
        assert_eq!(handle.members, vec![c1.id, c2.id]);

        assert_eq!(coord.active_date(c2.id), None);
        let update = coord.pointer_moved(c1.id, day(3)).unwrap();
        assert_eq!(update.date, day(3));
        assert_eq!(update.members.len(), 2);
        assert_eq!(coord.active_date(c2.id), Some(day(3)));
        assert_eq!(coord.active_index(c2.id), Some(2));
    }

    #[test]
    fn test_hover_snaps_to_sample() {
        let data = make_dataset();
        let mut coord = CrosshairCoordinator::new();
        let g = coord.create_group();
        let c1 = chart(&data, g);
        let c2 = chart(&data, g);
        coord.link_group(&[c1.clone(), c2.clone()], &data).unwrap();

        coord.pointer_moved(c1.id, day(2) + Duration::hours(20)).unwrap();
        assert_eq!(coord.active_date(c1.id), Some(day(3)));
        assert_eq!(coord.active_date(c2.id), Some(day(3)));
    }

    #[test]
    fn test_leave_returns_to_idle() {
        let data = make_dataset();
        let mut coord = CrosshairCoordinator::new();
        let g = coord.create_group();
        let c1 = chart(&data, g);
        let c2 = chart(&data, g);
        coord.link_group(&[c1.clone(), c2.clone()], &data).unwrap();

        coord.pointer_moved(c1.id, day(1)).unwrap();
        assert_eq!(coord.pointer_left(c1.id).unwrap(), CrosshairState::Idle);
        assert_eq!(coord.active_date(c2.id), None);
        assert_eq!(coord.state(g), Some(CrosshairState::Idle));
    }

    #[test]
    fn test_move_to_sibling_then_leave_first() {
        let data = make_dataset();
        let mut coord = CrosshairCoordinator::new();
        let g = coord.create_group();
        let c1 = chart(&data, g);
        let c2 = chart(&data, g);
        coord.link_group(&[c1.clone(), c2.clone()], &data).unwrap();

        coord.pointer_moved(c1.id, day(1)).unwrap();
        coord.pointer_moved(c2.id, day(4)).unwrap();
        // Leaving c1 late must not clear c2's hover
        let state = coord.pointer_left(c1.id).unwrap();
        assert!(matches!(state, CrosshairState::Tracking { source, .. } if source == c2.id));
        assert_eq!(coord.active_date(c1.id), Some(day(4)));
    }

    #[test]
    fn test_groups_are_disjoint() {
        let data = make_dataset();
        let mut coord = CrosshairCoordinator::new();
        let g1 = coord.create_group();
        let g2 = coord.create_group();
        let a = chart(&data, g1);
        let b = chart(&data, g1);
        let c = chart(&data, g2);
        coord.link_group(&[a.clone(), b.clone()], &data).unwrap();
        coord.link_group(&[c.clone()], &data).unwrap();

        coord.pointer_moved(a.id, day(2)).unwrap();
        assert_eq!(coord.active_date(b.id), Some(day(2)));
        assert_eq!(coord.active_date(c.id), None);
    }

    #[test]
    fn test_relink_replaces_membership() {
        let data = make_dataset();
        let mut coord = CrosshairCoordinator::new();
        let g = coord.create_group();
        let old = chart(&data, g);
        let keep = chart(&data, g);
        coord.link_group(&[old.clone(), keep.clone()], &data).unwrap();

        let rebuilt = chart(&data, g);
        coord.link_group(&[rebuilt.clone(), keep.clone()], &data).unwrap();

        assert_eq!(coord.group_of(old.id), None);
        assert_eq!(coord.members(g), &[rebuilt.id, keep.id]);
        assert_eq!(coord.pointer_moved(old.id, day(1)), Err(PlotError::UnknownChart));
    }

    #[test]
    fn test_link_moves_chart_between_groups() {
        let data = make_dataset();
        let mut coord = CrosshairCoordinator::new();
        let g1 = coord.create_group();
        let a = chart(&data, g1);
        let b = chart(&data, g1);
        coord.link_group(&[a.clone(), b.clone()], &data).unwrap();

        // Rebuilt under a new group id, b is no longer in g1
        let g2 = coord.create_group();
        let b2 = ChartSpec { group: g2, ..b.clone() };
        coord.link_group(&[b2.clone()], &data).unwrap();
        assert_eq!(coord.members(g1), &[a.id]);
        assert_eq!(coord.group_of(b.id), Some(g2));
    }

    #[test]
    fn test_link_errors() {
        let data = make_dataset();
        let mut coord = CrosshairCoordinator::new();
        assert_eq!(coord.link_group(&[], &data), Err(PlotError::EmptyGroup));

        let g1 = coord.create_group();
        let g2 = coord.create_group();
        let res = coord.link_group(&[chart(&data, g1), chart(&data, g2)], &data);
        assert_eq!(res, Err(PlotError::GroupMismatch));
    }

    #[test]
    fn test_detach_drops_empty_group() {
        let data = make_dataset();
        let mut coord = CrosshairCoordinator::new();
        let g = coord.create_group();
        let a = chart(&data, g);
        coord.link_group(&[a.clone()], &data).unwrap();
        coord.pointer_moved(a.id, day(5)).unwrap();

        coord.detach(a.id);
        assert_eq!(coord.state(g), None);
        assert!(coord.members(g).is_empty());
        assert_eq!(coord.pointer_left(a.id), Err(PlotError::UnknownChart));
    }
}

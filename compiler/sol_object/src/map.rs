//! Raw map storage.
//!
//! A map is an ordered list of `mcell` objects. Lookups walk the cells in
//! insertion order; two keys match when both are names with equal bytes, or
//! otherwise when `cmp(probe, key) == 0`. These functions never consult
//! `__index`/`__setindex`; the map handlers in `ops::map` layer that on top.

use crate::object::{Object, Payload};
use crate::{SolResult, State};

impl State {
    fn find_cell(&mut self, map: &Object, key: &Object) -> SolResult<Option<Object>> {
        let Some(cells) = map.cells() else {
            return Ok(None);
        };
        let probe = key.name_bytes();
        for cell in cells {
            let Some((cell_key, _)) = cell.cell_parts() else {
                continue;
            };
            let matched = match (&probe, cell_key.name_bytes()) {
                (Some(probe), Some(name)) => *probe == name,
                _ => self.cmp(key, &cell_key)? == 0,
            };
            if matched {
                return Ok(Some(cell));
            }
        }
        Ok(None)
    }

    /// Value stored under `key`.
    pub fn map_get(&mut self, map: &Object, key: &Object) -> SolResult<Option<Object>> {
        Ok(self
            .find_cell(map, key)?
            .and_then(|cell| cell.cell_parts())
            .map(|(_, val)| val))
    }

    /// Store `value` under `key`, replacing an equal key in place.
    pub fn map_set(&mut self, map: &Object, key: &Object, value: Object) -> SolResult<()> {
        match self.find_cell(map, key)? {
            Some(cell) => replace_value(&cell, value),
            None => push_cell(map, Object::mcell(key.clone(), value)),
        }
        Ok(())
    }

    /// Value stored under the name `name`. Names only ever match names, so
    /// this never dispatches.
    pub fn map_get_name(&self, map: &Object, name: &str) -> Option<Object> {
        find_name(map, name)
            .and_then(|cell| cell.cell_parts())
            .map(|(_, val)| val)
    }

    pub fn map_set_name(&self, map: &Object, name: &str, value: Object) {
        match find_name(map, name) {
            Some(cell) => replace_value(&cell, value),
            None => push_cell(map, Object::mcell(Object::string(name), value)),
        }
    }
}

/// A fresh map holding `entries` in order.
pub fn map_of<'a>(entries: impl IntoIterator<Item = (&'a str, Object)>) -> Object {
    let cells = entries
        .into_iter()
        .map(|(name, value)| Object::mcell(Object::string(name), value))
        .collect();
    Object::new(Payload::Map(cells))
}

/// Number of cells in a map, 0 for anything else.
pub fn map_len(map: &Object) -> usize {
    match &*map.borrow() {
        Payload::Map(cells) => cells.len(),
        _ => 0,
    }
}

fn find_name(map: &Object, name: &str) -> Option<Object> {
    map.cells()?.into_iter().find(|cell| {
        cell.cell_parts()
            .is_some_and(|(key, _)| key.is_name(name))
    })
}

fn replace_value(cell: &Object, value: Object) {
    let old = match &mut *cell.borrow_mut() {
        Payload::MCell { val, .. } => Some(std::mem::replace(val, value)),
        _ => None,
    };
    drop(old);
}

fn push_cell(map: &Object, cell: Object) {
    if let Payload::Map(cells) = &mut *map.borrow_mut() {
        cells.push(cell);
    }
}

//! Named per-loop UV layers

use crate::float_types::Real;
use nalgebra::Point2;

/// One UV coordinate per loop, under a name.
#[derive(Debug, Clone, PartialEq)]
pub struct UvLayer {
    pub name: String,
    pub data: Vec<Point2<Real>>,
}

impl UvLayer {
    /// A layer of `loop_count` coordinates at the origin
    pub fn new(name: impl Into<String>, loop_count: usize) -> Self {
        UvLayer {
            name: name.into(),
            data: vec![Point2::origin(); loop_count],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Ordered list of UV layers with one optional *active* layer.
///
/// The active layer is the one written to the interchange file. Appending never
/// changes it unless the list was empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UvLayers {
    layers: Vec<UvLayer>,
    active: Option<usize>,
}

impl UvLayers {
    pub const fn new() -> Self {
        UvLayers {
            layers: Vec::new(),
            active: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UvLayer> {
        self.layers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut UvLayer> {
        self.layers.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&UvLayer> {
        self.layers.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut UvLayer> {
        self.layers.get_mut(index)
    }

    /// Index of the first layer called exactly `name`
    pub fn find(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.name == name)
    }

    pub fn by_name(&self, name: &str) -> Option<&UvLayer> {
        self.find(name).and_then(|index| self.layers.get(index))
    }

    pub fn last(&self) -> Option<&UvLayer> {
        self.layers.last()
    }

    pub const fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&UvLayer> {
        self.active.and_then(|index| self.layers.get(index))
    }

    /// Make `index` the active layer; out-of-range indices are ignored
    pub fn set_active(&mut self, index: usize) {
        if index < self.layers.len() {
            self.active = Some(index);
        }
    }

    /// `name`, or `name.001`, `name.002`, ... if a layer already uses it
    pub fn unique_name(&self, name: &str) -> String {
        if self.find(name).is_none() {
            return name.to_string();
        }
        (1..)
            .map(|n| format!("{name}.{n:03}"))
            .find(|candidate| self.find(candidate).is_none())
            .unwrap_or_else(|| name.to_string())
    }

    /// Append a fresh zero-filled layer and return its index.
    ///
    /// An existing layer with the same name is left alone; the new one gets a numbered suffix.
    pub fn append(&mut self, name: &str, loop_count: usize) -> usize {
        let name = self.unique_name(name);
        self.push(UvLayer::new(name, loop_count))
    }

    /// Append `layer` as is and return its index
    pub fn push(&mut self, layer: UvLayer) -> usize {
        self.layers.push(layer);
        let index = self.layers.len() - 1;
        if self.active.is_none() {
            self.active = Some(index);
        }
        index
    }

    /// Remove the layer at `index`. The active layer keeps pointing at the same layer when it
    /// survives; removing the active layer activates its predecessor (or the new first layer).
    pub fn remove(&mut self, index: usize) -> Option<UvLayer> {
        if index >= self.layers.len() {
            return None;
        }
        let removed = self.layers.remove(index);
        self.active = match self.active {
            _ if self.layers.is_empty() => None,
            Some(active) if active == index => {
                Some(index.saturating_sub(1).min(self.layers.len() - 1))
            },
            Some(active) if active > index => Some(active - 1),
            other => other,
        };
        Some(removed)
    }

    /// Move the layer at `index` to the end of the list with its content unchanged.
    ///
    /// Already-terminal layers are left where they are. The active marker follows the layer
    /// it pointed at.
    pub fn move_to_end(&mut self, index: usize) {
        let last = match self.layers.len().checked_sub(1) {
            Some(last) if index < last => last,
            _ => return,
        };
        let layer = self.layers.remove(index);
        self.layers.push(layer);
        self.active = self.active.map(|active| match active {
            a if a == index => last,
            a if a > index => a - 1,
            a => a,
        });
    }

    /// Replace the active layer by a terminal copy called `name`.
    ///
    /// Afterwards the copied content sits in the last layer, which is also the active one, and
    /// the old active layer is gone. Returns the new index, or `None` without an active layer.
    pub fn promote_active(&mut self, name: &str) -> Option<usize> {
        let active = self.active?;
        let data = self.layers[active].data.clone();
        self.layers.remove(active);
        let name = self.unique_name(name);
        self.layers.push(UvLayer { name, data });
        let index = self.layers.len() - 1;
        self.active = Some(index);
        Some(index)
    }

    /// Keep only the loops whose `keep` flag is set, in every layer
    pub fn retain_loops(&mut self, keep: &[bool]) {
        for layer in &mut self.layers {
            let mut flags = keep.iter();
            layer.data.retain(|_| flags.next().copied().unwrap_or(false));
        }
    }

    pub fn clear(&mut self) {
        self.layers.clear();
        self.active = None;
    }
}

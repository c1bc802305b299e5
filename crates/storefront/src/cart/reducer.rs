//! Cart state and its transitions.
//!
//! Transitions are pure: the same state and action always produce the same
//! next state. Nothing here talks to the gateway.

use cartsync_core::ProductId;
use serde::Serialize;

/// A transition of the cart contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Replace the whole cart. Ids are taken as given.
    SetCart(Vec<ProductId>),
    /// Append one product.
    AddProduct { id: ProductId },
    /// Drop every entry for a product.
    RemoveProduct { id: ProductId },
    /// Empty the cart.
    ClearCart,
}

/// Products in the cart, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CartState(Vec<ProductId>);

impl CartState {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Apply an action, returning the next state.
    #[must_use]
    pub fn reduce(mut self, action: CartAction) -> Self {
        self.apply(action);
        self
    }

    /// Apply an action in place.
    pub fn apply(&mut self, action: CartAction) {
        match action {
            CartAction::SetCart(ids) => self.0 = ids,
            // No uniqueness check: callers gate adds on `contains`.
            CartAction::AddProduct { id } => self.0.push(id),
            CartAction::RemoveProduct { id } => self.0.retain(|existing| *existing != id),
            CartAction::ClearCart => self.0.clear(),
        }
    }

    #[must_use]
    pub fn items(&self) -> &[ProductId] {
        &self.0
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.0.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<ProductId>> for CartState {
    fn from(ids: Vec<ProductId>) -> Self {
        Self(ids)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ids(raw: &[i64]) -> Vec<ProductId> {
        raw.iter().copied().map(ProductId::new).collect()
    }

    fn state(raw: &[i64]) -> CartState {
        CartState::from(ids(raw))
    }

    #[test]
    fn test_set_cart_replaces_without_dedup() {
        let next = state(&[1, 2]).reduce(CartAction::SetCart(ids(&[7, 9, 7])));
        assert_eq!(next.items(), ids(&[7, 9, 7]).as_slice());
    }

    #[test]
    fn test_add_appends_last() {
        let before = state(&[4, 5]);
        let next = before
            .clone()
            .reduce(CartAction::AddProduct { id: ProductId::new(3) });
        assert_eq!(next.len(), before.len() + 1);
        assert_eq!(next.items().last(), Some(&ProductId::new(3)));
    }

    #[test]
    fn test_add_does_not_guard_duplicates() {
        let next = state(&[3]).reduce(CartAction::AddProduct { id: ProductId::new(3) });
        assert_eq!(next, state(&[3, 3]));
    }

    #[test]
    fn test_remove_present_once() {
        let next = state(&[1, 3, 5]).reduce(CartAction::RemoveProduct { id: ProductId::new(3) });
        assert_eq!(next, state(&[1, 5]));
        assert!(!next.contains(ProductId::new(3)));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let before = state(&[1, 5]);
        let next = before
            .clone()
            .reduce(CartAction::RemoveProduct { id: ProductId::new(3) });
        assert_eq!(next, before);
    }

    #[test]
    fn test_remove_purges_every_copy() {
        let next = state(&[3, 1, 3]).reduce(CartAction::RemoveProduct { id: ProductId::new(3) });
        assert_eq!(next, state(&[1]));
    }

    #[test]
    fn test_clear_always_empties() {
        for start in [state(&[]), state(&[1]), state(&[1, 2, 2, 9])] {
            assert!(start.reduce(CartAction::ClearCart).is_empty());
        }
    }

    #[test]
    fn test_replay_is_deterministic() {
        let actions = vec![
            CartAction::SetCart(ids(&[10, 11])),
            CartAction::AddProduct { id: ProductId::new(12) },
            CartAction::RemoveProduct { id: ProductId::new(10) },
            CartAction::AddProduct { id: ProductId::new(13) },
            CartAction::ClearCart,
            CartAction::AddProduct { id: ProductId::new(14) },
            CartAction::AddProduct { id: ProductId::new(15) },
            CartAction::RemoveProduct { id: ProductId::new(99) },
        ];

        let run = |start: CartState| actions.iter().cloned().fold(start, CartState::reduce);

        let first = run(state(&[1, 2]));
        let second = run(state(&[1, 2]));
        assert_eq!(first, second);
        assert_eq!(first, state(&[14, 15]));
    }
}

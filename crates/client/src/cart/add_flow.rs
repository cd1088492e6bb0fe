//! Add-to-cart flow with variant resolution.
//!
//! The flow is an explicit state machine ([`FlowMachine`]) fed with events.
//! Each transition yields a [`FlowCommand`] that the
//! [`AddToCartController`] executes, feeding the result back as the next
//! event. Every flow carries a number; events from a superseded flow are
//! discarded.
//!
//! ```text
//! Idle -> ResolvingProduct -> VariantSelectionPending -> AddingDirect -> Completed -> Idle
//!                          \-------------------------/             \-> Failed    -> Idle
//! ```

use std::mem;
use std::sync::Arc;

use shopfront_core::{AddToCartRequest, ProductId, VariantSet, VariationId};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use super::counter::SharedCartCounter;
use super::sync::{CartSyncController, RefreshOutcome};
use crate::error::AddToCartError;
use crate::gateway::{CartGateway, GatewayError};

/// Where the add flow currently is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Idle,
    /// Fetching the product's variants.
    ResolvingProduct { product_id: ProductId },
    /// Waiting for the user to pick one of `variants`.
    VariantSelectionPending {
        product_id: ProductId,
        variants: VariantSet,
    },
    /// The add call is in flight.
    AddingDirect { request: AddToCartRequest },
    /// The add succeeded.
    Completed { request: AddToCartRequest },
    /// A step failed with `message`.
    Failed { message: String },
}

/// Inputs to the flow.
#[derive(Debug, Clone)]
pub enum FlowEvent {
    RequestAdd(ProductId),
    DetailResolved { flow: u64, variants: VariantSet },
    VariantConfirmed(VariationId),
    SelectionCancelled,
    AddSucceeded { flow: u64 },
    StepFailed { flow: u64, message: String },
    Acknowledge,
}

/// What the driver should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowCommand {
    FetchDetail { flow: u64, product_id: ProductId },
    PresentVariants(VariantSet),
    SubmitAdd { flow: u64, request: AddToCartRequest },
    Complete(AddToCartRequest),
    Surface(String),
    /// The event belonged to a superseded flow.
    Discard,
    /// Nothing left to do.
    Stop,
}

/// The add-to-cart state machine. Pure; performs no I/O.
#[derive(Debug, Clone, Default)]
pub struct FlowMachine {
    state: FlowState,
    flow: u64,
}

impl FlowMachine {
    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &FlowState {
        &self.state
    }

    /// Number of the current flow.
    #[must_use]
    pub const fn flow(&self) -> u64 {
        self.flow
    }

    /// Apply `event` and return the command to run.
    ///
    /// # Errors
    ///
    /// `Busy` for a new request while an add call is in flight,
    /// `NoSelectionPending` or `UnknownVariant` for a confirmation that does
    /// not match an open selection. The state is unchanged on error.
    pub fn handle(&mut self, event: FlowEvent) -> Result<FlowCommand, AddToCartError> {
        match event {
            FlowEvent::RequestAdd(product_id) => {
                if matches!(self.state, FlowState::AddingDirect { .. }) {
                    return Err(AddToCartError::Busy);
                }
                self.flow += 1;
                self.state = FlowState::ResolvingProduct { product_id };
                Ok(FlowCommand::FetchDetail {
                    flow: self.flow,
                    product_id,
                })
            }

            FlowEvent::DetailResolved { flow, variants } => {
                let FlowState::ResolvingProduct { product_id } = self.state else {
                    return Ok(FlowCommand::Discard);
                };
                if flow != self.flow {
                    return Ok(FlowCommand::Discard);
                }
                if variants.is_empty() {
                    let request = AddToCartRequest::single(product_id, None);
                    self.state = FlowState::AddingDirect {
                        request: request.clone(),
                    };
                    Ok(FlowCommand::SubmitAdd { flow, request })
                } else {
                    self.state = FlowState::VariantSelectionPending {
                        product_id,
                        variants: variants.clone(),
                    };
                    Ok(FlowCommand::PresentVariants(variants))
                }
            }

            FlowEvent::VariantConfirmed(variation_id) => {
                let FlowState::VariantSelectionPending {
                    product_id,
                    variants,
                } = &self.state
                else {
                    return Err(AddToCartError::NoSelectionPending);
                };
                if variants.find(variation_id).is_none() {
                    return Err(AddToCartError::UnknownVariant(variation_id));
                }
                let request = AddToCartRequest::single(*product_id, Some(variation_id));
                self.state = FlowState::AddingDirect {
                    request: request.clone(),
                };
                Ok(FlowCommand::SubmitAdd {
                    flow: self.flow,
                    request,
                })
            }

            FlowEvent::SelectionCancelled => {
                if matches!(self.state, FlowState::VariantSelectionPending { .. }) {
                    self.state = FlowState::Idle;
                }
                Ok(FlowCommand::Stop)
            }

            FlowEvent::AddSucceeded { flow } => {
                if flow != self.flow {
                    return Ok(FlowCommand::Discard);
                }
                match mem::take(&mut self.state) {
                    FlowState::AddingDirect { request } => {
                        self.state = FlowState::Completed {
                            request: request.clone(),
                        };
                        Ok(FlowCommand::Complete(request))
                    }
                    other => {
                        self.state = other;
                        Ok(FlowCommand::Discard)
                    }
                }
            }

            FlowEvent::StepFailed { flow, message } => {
                let in_io_step = matches!(
                    self.state,
                    FlowState::ResolvingProduct { .. } | FlowState::AddingDirect { .. }
                );
                if flow != self.flow || !in_io_step {
                    return Ok(FlowCommand::Discard);
                }
                self.state = FlowState::Failed {
                    message: message.clone(),
                };
                Ok(FlowCommand::Surface(message))
            }

            FlowEvent::Acknowledge => {
                if matches!(
                    self.state,
                    FlowState::Completed { .. } | FlowState::Failed { .. }
                ) {
                    self.state = FlowState::Idle;
                }
                Ok(FlowCommand::Stop)
            }
        }
    }
}

// =============================================================================
// Controller
// =============================================================================

/// How a `request_add` or `confirm_variant` call ended.
#[derive(Debug)]
pub enum AddOutcome {
    /// The item was added, the counter bumped and the cart refreshed.
    Added {
        request: AddToCartRequest,
        refresh: RefreshOutcome,
    },
    /// The product has variants; call `confirm_variant` with one of them.
    SelectionRequired(VariantSet),
    /// A newer request replaced this flow before it finished. Nothing was added.
    Superseded,
}

/// Runs the add-to-cart flow against a [`CartGateway`].
pub struct AddToCartController<G> {
    gateway: Arc<G>,
    machine: Arc<watch::Sender<FlowMachine>>,
    counter: SharedCartCounter,
    cart: CartSyncController<G>,
}

impl<G> Clone for AddToCartController<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            machine: Arc::clone(&self.machine),
            counter: self.counter.clone(),
            cart: self.cart.clone(),
        }
    }
}

impl<G: CartGateway> AddToCartController<G> {
    /// Create a controller bumping `counter` and refreshing `cart` on success.
    #[must_use]
    pub fn new(gateway: Arc<G>, counter: SharedCartCounter, cart: CartSyncController<G>) -> Self {
        let (machine, _) = watch::channel(FlowMachine::default());
        Self {
            gateway,
            machine: Arc::new(machine),
            counter,
            cart,
        }
    }

    /// Current flow state.
    #[must_use]
    pub fn state(&self) -> FlowState {
        self.machine.borrow().state.clone()
    }

    /// Subscribe to flow transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FlowMachine> {
        self.machine.subscribe()
    }

    /// Start adding `product_id`. Replaces a flow that is still resolving or
    /// waiting on a variant choice.
    ///
    /// # Errors
    ///
    /// `Busy` while an add call is in flight; `Gateway` when fetching the
    /// product or adding it fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn request_add(&self, product_id: ProductId) -> Result<AddOutcome, AddToCartError> {
        let command = self.dispatch(FlowEvent::RequestAdd(product_id))?;
        self.drive(command).await
    }

    /// Add the chosen variant of the product awaiting selection.
    ///
    /// # Errors
    ///
    /// `NoSelectionPending` or `UnknownVariant` when the choice does not match
    /// the open selection; `Gateway` when the add call fails.
    #[instrument(skip(self), fields(variation_id = %variation_id))]
    pub async fn confirm_variant(
        &self,
        variation_id: VariationId,
    ) -> Result<AddOutcome, AddToCartError> {
        let command = self.dispatch(FlowEvent::VariantConfirmed(variation_id))?;
        self.drive(command).await
    }

    /// Dismiss the variant selection without adding anything.
    ///
    /// Returns whether a selection was open.
    pub fn cancel_variant_selection(&self) -> bool {
        let was_pending = matches!(
            self.machine.borrow().state,
            FlowState::VariantSelectionPending { .. }
        );
        // Cancelling only ever stops, it cannot fail.
        let _ = self.dispatch(FlowEvent::SelectionCancelled);
        if was_pending {
            debug!("Variant selection cancelled");
        }
        was_pending
    }

    /// Apply an event, notifying subscribers when the state moved.
    fn dispatch(&self, event: FlowEvent) -> Result<FlowCommand, AddToCartError> {
        let mut result = Ok(FlowCommand::Stop);
        self.machine.send_if_modified(|machine| {
            let before = (mem::discriminant(&machine.state), machine.flow);
            result = machine.handle(event);
            (mem::discriminant(&machine.state), machine.flow) != before
        });
        result
    }

    async fn drive(&self, mut command: FlowCommand) -> Result<AddOutcome, AddToCartError> {
        loop {
            command = match command {
                FlowCommand::FetchDetail { flow, product_id } => {
                    match self.gateway.get_product_detail(product_id).await {
                        Ok(detail) => self.dispatch(FlowEvent::DetailResolved {
                            flow,
                            variants: detail.variants,
                        })?,
                        Err(err) => return self.fail(flow, err),
                    }
                }
                FlowCommand::PresentVariants(variants) => {
                    debug!(options = variants.options.len(), "Variant selection required");
                    return Ok(AddOutcome::SelectionRequired(variants));
                }
                FlowCommand::SubmitAdd { flow, request } => {
                    match self.gateway.add_to_cart(&request).await {
                        Ok(()) => self.dispatch(FlowEvent::AddSucceeded { flow })?,
                        Err(err) => return self.fail(flow, err),
                    }
                }
                FlowCommand::Complete(request) => {
                    let count = self.counter.increment();
                    debug!(count, "Added to cart");
                    self.dispatch(FlowEvent::Acknowledge)?;
                    let refresh = self.cart.refresh_cart().await;
                    return Ok(AddOutcome::Added { request, refresh });
                }
                FlowCommand::Surface(_) | FlowCommand::Discard | FlowCommand::Stop => {
                    debug!("Flow superseded");
                    return Ok(AddOutcome::Superseded);
                }
            };
        }
    }

    /// Surface a failed step, then return the machine to idle.
    fn fail(&self, flow: u64, err: GatewayError) -> Result<AddOutcome, AddToCartError> {
        let command = self.dispatch(FlowEvent::StepFailed {
            flow,
            message: err.user_message(),
        })?;
        if !matches!(command, FlowCommand::Surface(_)) {
            debug!(flow, error = %err, "Failure from superseded flow dropped");
            return Ok(AddOutcome::Superseded);
        }
        warn!(flow, error = %err, "Add to cart failed");
        self.dispatch(FlowEvent::Acknowledge)?;
        Err(AddToCartError::Gateway(err))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::{FakeCart, cart, detail};

    struct Harness {
        gateway: Arc<FakeCart>,
        counter: SharedCartCounter,
        sync: CartSyncController<FakeCart>,
        controller: AddToCartController<FakeCart>,
    }

    fn harness() -> Harness {
        let gateway = Arc::new(FakeCart::default());
        let counter = SharedCartCounter::new(0);
        let sync = CartSyncController::new(Arc::clone(&gateway), Duration::from_millis(300));
        let controller =
            AddToCartController::new(Arc::clone(&gateway), counter.clone(), sync.clone());
        Harness {
            gateway,
            counter,
            sync,
            controller,
        }
    }

    // -------------------------------------------------------------------------
    // Machine
    // -------------------------------------------------------------------------

    #[test]
    fn test_machine_direct_path() {
        let mut machine = FlowMachine::default();
        let pid = ProductId::new(5);

        let cmd = machine.handle(FlowEvent::RequestAdd(pid)).unwrap();
        assert_eq!(cmd, FlowCommand::FetchDetail { flow: 1, product_id: pid });

        let cmd = machine
            .handle(FlowEvent::DetailResolved {
                flow: 1,
                variants: VariantSet::default(),
            })
            .unwrap();
        let request = AddToCartRequest::single(pid, None);
        assert_eq!(
            cmd,
            FlowCommand::SubmitAdd {
                flow: 1,
                request: request.clone()
            }
        );

        let cmd = machine.handle(FlowEvent::AddSucceeded { flow: 1 }).unwrap();
        assert_eq!(cmd, FlowCommand::Complete(request));
        machine.handle(FlowEvent::Acknowledge).unwrap();
        assert_eq!(machine.state(), &FlowState::Idle);
    }

    #[test]
    fn test_machine_rejects_request_while_adding() {
        let mut machine = FlowMachine::default();
        machine.handle(FlowEvent::RequestAdd(ProductId::new(5))).unwrap();
        machine
            .handle(FlowEvent::DetailResolved {
                flow: 1,
                variants: VariantSet::default(),
            })
            .unwrap();

        let err = machine
            .handle(FlowEvent::RequestAdd(ProductId::new(6)))
            .unwrap_err();
        assert!(matches!(err, AddToCartError::Busy));
        assert!(matches!(machine.state(), FlowState::AddingDirect { .. }));
    }

    #[test]
    fn test_machine_discards_superseded_detail() {
        let mut machine = FlowMachine::default();
        machine.handle(FlowEvent::RequestAdd(ProductId::new(5))).unwrap();
        machine.handle(FlowEvent::RequestAdd(ProductId::new(6))).unwrap();

        let cmd = machine
            .handle(FlowEvent::DetailResolved {
                flow: 1,
                variants: detail(5, &[51]).variants,
            })
            .unwrap();
        assert_eq!(cmd, FlowCommand::Discard);
        assert_eq!(
            machine.state(),
            &FlowState::ResolvingProduct {
                product_id: ProductId::new(6)
            }
        );
    }

    #[test]
    fn test_machine_confirm_without_selection() {
        let mut machine = FlowMachine::default();
        let err = machine
            .handle(FlowEvent::VariantConfirmed(VariationId::new(1)))
            .unwrap_err();
        assert!(matches!(err, AddToCartError::NoSelectionPending));
    }

    #[test]
    fn test_machine_failure_then_idle() {
        let mut machine = FlowMachine::default();
        machine.handle(FlowEvent::RequestAdd(ProductId::new(5))).unwrap();
        let cmd = machine
            .handle(FlowEvent::StepFailed {
                flow: 1,
                message: "Product not found".to_string(),
            })
            .unwrap();
        assert_eq!(cmd, FlowCommand::Surface("Product not found".to_string()));
        machine.handle(FlowEvent::Acknowledge).unwrap();
        assert_eq!(machine.state(), &FlowState::Idle);

        // A fresh request starts cleanly.
        let cmd = machine.handle(FlowEvent::RequestAdd(ProductId::new(5))).unwrap();
        assert!(matches!(cmd, FlowCommand::FetchDetail { flow: 2, .. }));
    }

    // -------------------------------------------------------------------------
    // Controller
    // -------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_product_without_variants_is_added_directly() {
        let h = harness();
        h.gateway.detail.push(Ok(detail(5, &[])));
        h.gateway.add.push(Ok(()));
        h.gateway.cart.push(Ok(cart(&[(5, 1)])));

        let outcome = h.controller.request_add(ProductId::new(5)).await.unwrap();
        assert!(matches!(
            outcome,
            AddOutcome::Added {
                refresh: RefreshOutcome::Shown,
                ..
            }
        ));

        let adds = h.gateway.add.calls();
        assert_eq!(adds, vec![AddToCartRequest::single(ProductId::new(5), None)]);
        assert_eq!(
            serde_json::to_value(&adds[0]).unwrap()["variation_id"],
            serde_json::json!("")
        );
        assert_eq!(h.counter.value(), 1);
        assert_eq!(h.gateway.cart.call_count(), 1);
        assert!(h.sync.snapshot().preview_visible);
        assert_eq!(h.controller.state(), FlowState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_product_with_variants_waits_for_confirmation() {
        let h = harness();
        h.gateway.detail.push(Ok(detail(5, &[51, 52])));

        let outcome = h.controller.request_add(ProductId::new(5)).await.unwrap();
        let AddOutcome::SelectionRequired(variants) = outcome else {
            panic!("expected a variant selection");
        };
        assert_eq!(variants.options.len(), 2);
        assert_eq!(h.gateway.add.call_count(), 0);
        assert!(matches!(
            h.controller.state(),
            FlowState::VariantSelectionPending { .. }
        ));

        h.gateway.add.push(Ok(()));
        h.gateway.cart.push(Ok(cart(&[(5, 1)])));
        let outcome = h
            .controller
            .confirm_variant(VariationId::new(52))
            .await
            .unwrap();
        assert!(matches!(outcome, AddOutcome::Added { .. }));
        assert_eq!(
            h.gateway.add.calls(),
            vec![AddToCartRequest::single(
                ProductId::new(5),
                Some(VariationId::new(52))
            )]
        );
        assert_eq!(h.counter.value(), 1);
        assert_eq!(h.gateway.cart.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_selection_adds_nothing() {
        let h = harness();
        h.gateway.detail.push(Ok(detail(5, &[51])));
        h.controller.request_add(ProductId::new(5)).await.unwrap();

        assert!(h.controller.cancel_variant_selection());
        assert_eq!(h.controller.state(), FlowState::Idle);
        assert!(!h.controller.cancel_variant_selection());

        let err = h
            .controller
            .confirm_variant(VariationId::new(51))
            .await
            .unwrap_err();
        assert!(matches!(err, AddToCartError::NoSelectionPending));
        assert_eq!(h.gateway.add.call_count(), 0);
        assert_eq!(h.counter.value(), 0);
    }

    #[tokio::test]
    async fn test_unknown_variant_keeps_selection_open() {
        let h = harness();
        h.gateway.detail.push(Ok(detail(5, &[51])));
        h.controller.request_add(ProductId::new(5)).await.unwrap();

        let err = h
            .controller
            .confirm_variant(VariationId::new(99))
            .await
            .unwrap_err();
        assert!(matches!(err, AddToCartError::UnknownVariant(_)));
        assert!(matches!(
            h.controller.state(),
            FlowState::VariantSelectionPending { .. }
        ));
    }

    #[tokio::test]
    async fn test_add_failure_surfaces_message_and_resets() {
        let h = harness();
        h.gateway.detail.push(Ok(detail(5, &[])));
        h.gateway.add.push(Err(GatewayError::Rejected(
            "Sorry, this product cannot be purchased.".to_string(),
        )));

        let err = h.controller.request_add(ProductId::new(5)).await.unwrap_err();
        assert_eq!(err.user_message(), "Sorry, this product cannot be purchased.");
        assert_eq!(h.controller.state(), FlowState::Idle);
        assert_eq!(h.counter.value(), 0);
        assert_eq!(h.gateway.cart.call_count(), 0);
    }

    #[tokio::test]
    async fn test_detail_failure_resets() {
        let h = harness();
        h.gateway
            .detail
            .push(Err(GatewayError::Rejected("Product not found".to_string())));

        let err = h.controller.request_add(ProductId::new(5)).await.unwrap_err();
        assert_eq!(err.to_string(), "Product not found");
        assert_eq!(h.controller.state(), FlowState::Idle);
        assert_eq!(h.gateway.add.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_request_supersedes_pending_selection() {
        let h = harness();
        h.gateway.detail.push(Ok(detail(5, &[51])));
        h.controller.request_add(ProductId::new(5)).await.unwrap();

        h.gateway.detail.push(Ok(detail(6, &[])));
        h.gateway.add.push(Ok(()));
        h.gateway.cart.push(Ok(cart(&[(6, 1)])));
        h.controller.request_add(ProductId::new(6)).await.unwrap();

        assert_eq!(
            h.gateway.add.calls(),
            vec![AddToCartRequest::single(ProductId::new(6), None)]
        );
        assert!(matches!(
            h.controller
                .confirm_variant(VariationId::new(51))
                .await
                .unwrap_err(),
            AddToCartError::NoSelectionPending
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_detail_of_superseded_flow_is_discarded() {
        let h = harness();

        let first = tokio::spawn({
            let controller = h.controller.clone();
            async move { controller.request_add(ProductId::new(5)).await }
        });
        h.gateway.detail.wait_for_parked(1).await;

        let second = tokio::spawn({
            let controller = h.controller.clone();
            async move { controller.request_add(ProductId::new(6)).await }
        });
        h.gateway.detail.wait_for_parked(2).await;

        h.gateway.detail.resolve(0, Ok(detail(5, &[])));
        assert!(matches!(first.await.unwrap().unwrap(), AddOutcome::Superseded));
        assert_eq!(h.gateway.add.call_count(), 0);

        h.gateway.add.push(Ok(()));
        h.gateway.cart.push(Ok(cart(&[(6, 1)])));
        h.gateway.detail.resolve(1, Ok(detail(6, &[])));
        assert!(matches!(
            second.await.unwrap().unwrap(),
            AddOutcome::Added { .. }
        ));
        assert_eq!(
            h.gateway.add.calls(),
            vec![AddToCartRequest::single(ProductId::new(6), None)]
        );
        assert_eq!(h.counter.value(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_while_adding_is_busy() {
        let h = harness();
        h.gateway.detail.push(Ok(detail(5, &[])));

        let first = tokio::spawn({
            let controller = h.controller.clone();
            async move { controller.request_add(ProductId::new(5)).await }
        });
        h.gateway.add.wait_for_parked(1).await;

        let err = h.controller.request_add(ProductId::new(6)).await.unwrap_err();
        assert!(matches!(err, AddToCartError::Busy));

        h.gateway.cart.push(Ok(cart(&[(5, 1)])));
        h.gateway.add.resolve(0, Ok(()));
        assert!(matches!(first.await.unwrap().unwrap(), AddOutcome::Added { .. }));
        assert_eq!(h.counter.value(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_still_counts_the_add() {
        let h = harness();
        h.gateway.detail.push(Ok(detail(5, &[])));
        h.gateway.add.push(Ok(()));
        h.gateway
            .cart
            .push(Err(GatewayError::Rejected("Session expired".to_string())));

        let outcome = h.controller.request_add(ProductId::new(5)).await.unwrap();
        assert!(matches!(
            outcome,
            AddOutcome::Added {
                refresh: RefreshOutcome::Failed(_),
                ..
            }
        ));
        assert_eq!(h.counter.value(), 1);
        assert!(!h.sync.snapshot().preview_visible);
        assert_eq!(h.sync.snapshot().last_error.as_deref(), Some("Session expired"));
    }
}

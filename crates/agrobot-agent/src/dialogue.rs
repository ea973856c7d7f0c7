// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The offer dialogue.
//!
//! [`Dialogue::handle`] runs one turn: it takes the session as it was before
//! the event, works on a copy, and returns the copy together with the
//! replies to send. It never fails. Input that does not fit the current
//! question, exhausted retries and store errors all end in the recovery
//! path, which re-identifies the user and asks for a direction again.
//!
//! A store error discards the replies produced so far and recovers from
//! the session as it was before the turn, so a half-finished turn leaves
//! nothing behind in the session.

use std::sync::Arc;

use agrobot_config::model::{AgrobotConfig, DialogueConfig};
use agrobot_core::{
    AgrobotError, CatalogStore, ChannelAdapter, Direction, EventKind, GeoPoint, InboundEvent,
    MessageBody, NewUser, QuickChoice, User, UserProfile,
};
use agrobot_matching::MatchingEngine;
use agrobot_resolver::{EntityResolver, ResolverLimits};
use tracing::{debug, error, info, warn};

use crate::keywords;
use crate::prompts::{self, Phrasing};
use crate::render;
use crate::session::Session;
use crate::state::{DialogueState, OfferDraft};

/// Postback payload sent by the transport's "Get Started" action.
pub const GET_STARTED: &str = "GET_STARTED";

/// Result of one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    /// Session to keep, or `None` when the conversation ended.
    pub session: Option<Session>,
    /// Replies in send order.
    pub replies: Vec<MessageBody>,
    /// An offer was stored this turn, so the session must be committed
    /// even if the replies never reach the user.
    pub persisted: bool,
}

/// How a state handler left the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    End,
    /// The event did not fit the current question.
    Uncaptured,
    /// The current question ran out of attempts.
    Exhausted,
}

struct TurnCtx<'a> {
    channel: &'a dyn ChannelAdapter,
    sender: &'a str,
    replies: Vec<MessageBody>,
    persisted: bool,
}

impl TurnCtx<'_> {
    fn say(&mut self, text: impl Into<String>) {
        self.replies.push(MessageBody::Text(text.into()));
    }

    fn push(&mut self, body: MessageBody) {
        self.replies.push(body);
    }
}

/// Drives offer collection for every user.
///
/// Holds no per-user state. Everything a turn needs comes in through the
/// session passed to [`Dialogue::handle`].
pub struct Dialogue {
    catalog: Arc<dyn CatalogStore>,
    resolver: EntityResolver,
    matcher: MatchingEngine,
    config: DialogueConfig,
    agent_name: String,
    phrasing: Phrasing,
}

impl Dialogue {
    pub fn new(catalog: Arc<dyn CatalogStore>, config: &AgrobotConfig) -> Self {
        let resolver = EntityResolver::new(
            Arc::clone(&catalog),
            ResolverLimits::from(&config.dialogue),
        );
        let matcher = MatchingEngine::new(Arc::clone(&catalog), config.matching.clone());
        Self {
            catalog,
            resolver,
            matcher,
            config: config.dialogue.clone(),
            agent_name: config.agent.name.clone(),
            phrasing: Phrasing::default(),
        }
    }

    /// Use a fixed phrasing policy instead of random phrasing.
    pub fn with_phrasing(mut self, phrasing: Phrasing) -> Self {
        self.phrasing = phrasing;
        self
    }

    /// Run one turn for `event` against the sender's current session.
    pub async fn handle(
        &self,
        channel: &dyn ChannelAdapter,
        current: Option<Session>,
        event: &InboundEvent,
    ) -> Turn {
        let mut ctx = TurnCtx {
            channel,
            sender: &event.sender_id,
            replies: Vec::new(),
            persisted: false,
        };
        let mut session = current.clone().unwrap_or_default();
        let from = session.state;

        match self.step(&mut ctx, &mut session, &event.kind).await {
            Ok(Step::Continue) => {
                debug!(
                    sender_id = ctx.sender,
                    from = %from,
                    to = %session.state,
                    "dialogue turn complete"
                );
                Turn {
                    session: Some(session),
                    replies: ctx.replies,
                    persisted: ctx.persisted,
                }
            }
            Ok(Step::End) => {
                info!(sender_id = ctx.sender, state = %from, "conversation ended");
                Turn {
                    session: None,
                    replies: ctx.replies,
                    persisted: ctx.persisted,
                }
            }
            Ok(step) => {
                info!(
                    sender_id = ctx.sender,
                    state = %from,
                    event = event.kind.label(),
                    exhausted = step == Step::Exhausted,
                    "input not understood, restarting"
                );
                let preamble = self.phrasing.pick(prompts::SORRY);
                let session = self.restart(&mut ctx, current.as_ref(), preamble).await;
                Turn {
                    session: Some(session),
                    replies: ctx.replies,
                    persisted: ctx.persisted,
                }
            }
            Err(e) => {
                error!(
                    sender_id = ctx.sender,
                    state = %from,
                    error = %e,
                    "dialogue turn failed, restarting"
                );
                ctx.replies.clear();
                let preamble = self.phrasing.pick(prompts::SORRY);
                let session = self.restart(&mut ctx, current.as_ref(), preamble).await;
                Turn {
                    session: Some(session),
                    replies: ctx.replies,
                    persisted: ctx.persisted,
                }
            }
        }
    }

    async fn step(
        &self,
        ctx: &mut TurnCtx<'_>,
        session: &mut Session,
        kind: &EventKind,
    ) -> Result<Step, AgrobotError> {
        match kind {
            EventKind::Postback { payload, .. } if payload == GET_STARTED => {
                return self.get_started(ctx, session).await;
            }
            EventKind::Text(text) if keywords::is_farewell(text) => {
                ctx.say(self.phrasing.pick(prompts::GOODBYE));
                return Ok(Step::End);
            }
            _ => {}
        }

        match (session.state, kind) {
            (DialogueState::Idle, EventKind::Text(text)) if keywords::is_greeting(text) => {
                self.greet(ctx, session).await
            }
            (DialogueState::AskDirection, _) => Ok(self.on_direction(ctx, session, kind)),
            (DialogueState::AskProduct, EventKind::Text(text)) => {
                self.on_product_query(ctx, session, text).await
            }
            (DialogueState::AskProductRetry, EventKind::Text(answer))
            | (DialogueState::AskProductRetry, EventKind::QuickReply { payload: answer, .. }) => {
                self.on_product_retry(ctx, session, answer).await
            }
            (DialogueState::ChooseProduct, EventKind::Postback { payload, .. }) => {
                self.on_product_choice(ctx, session, payload).await
            }
            (DialogueState::AskMeasurement, EventKind::QuickReply { payload, .. }) => {
                self.on_measurement(ctx, session, payload).await
            }
            (DialogueState::AskQuantity, EventKind::Text(text)) => {
                Ok(self.on_quantity(ctx, session, text))
            }
            (DialogueState::AskLocation, EventKind::Location(point)) => {
                self.on_location_share(ctx, session, *point).await
            }
            (DialogueState::AskLocationRefine, EventKind::QuickReply { payload, .. }) => {
                self.on_location_choice(ctx, session, payload).await
            }
            (DialogueState::AskPrice, EventKind::Text(text)) => {
                self.on_price(ctx, session, text).await
            }
            (DialogueState::AskPhone, EventKind::Text(text)) => {
                Ok(self.on_phone(ctx, session, text))
            }
            (DialogueState::AskEmail, EventKind::Text(text)) => {
                self.on_email(ctx, session, text).await
            }
            (DialogueState::Presenting, EventKind::Postback { payload, .. }) => {
                self.on_connect(ctx, session, payload).await
            }
            _ => Ok(Step::Uncaptured),
        }
    }

    // --- Conversation entry points ---

    async fn get_started(
        &self,
        ctx: &mut TurnCtx<'_>,
        session: &mut Session,
    ) -> Result<Step, AgrobotError> {
        let profile = self.profile(ctx, session.profile.clone()).await;
        let user = self.catalog.find_user_by_subject(ctx.sender).await?;
        for line in prompts::introduction(&self.agent_name) {
            ctx.say(line);
        }
        *session = Session::new(user, profile);
        self.ask_direction(ctx, session);
        Ok(Step::Continue)
    }

    async fn greet(
        &self,
        ctx: &mut TurnCtx<'_>,
        session: &mut Session,
    ) -> Result<Step, AgrobotError> {
        let profile = self.profile(ctx, session.profile.clone()).await;
        let user = self.catalog.find_user_by_subject(ctx.sender).await?;
        let greeting = if user.is_some() {
            prompts::WELCOME_BACK
        } else {
            prompts::HEY
        };
        ctx.say(self.phrasing.pick(greeting));
        *session = Session::new(user, profile);
        self.ask_direction(ctx, session);
        Ok(Step::Continue)
    }

    /// Start over at the direction question, rebinding the user if the
    /// store knows them. Never fails.
    async fn restart(
        &self,
        ctx: &mut TurnCtx<'_>,
        previous: Option<&Session>,
        preamble: &str,
    ) -> Session {
        let known = previous.and_then(|s| s.user.clone());
        let user = match self.catalog.find_user_by_subject(ctx.sender).await {
            Ok(found) => found.or(known),
            Err(e) => {
                warn!(sender_id = ctx.sender, error = %e, "user lookup failed during restart");
                known
            }
        };
        let profile = previous.and_then(|s| s.profile.clone());

        let mut session = Session::new(user, profile);
        ctx.say(preamble);
        self.ask_direction(ctx, &mut session);
        session
    }

    // --- State handlers ---

    fn on_direction(&self, ctx: &mut TurnCtx<'_>, session: &mut Session, kind: &EventKind) -> Step {
        let direction = match kind {
            EventKind::QuickReply { payload, .. } => Direction::from_payload(payload),
            EventKind::Text(text) => keywords::direction(text),
            _ => None,
        };
        let Some(direction) = direction else {
            return Step::Uncaptured;
        };

        session.draft = OfferDraft::new(direction);
        session.products.clear();
        self.enter(ctx, session, DialogueState::AskProduct);
        self.ask(ctx, session)
    }

    async fn on_product_query(
        &self,
        ctx: &mut TurnCtx<'_>,
        session: &mut Session,
        text: &str,
    ) -> Result<Step, AgrobotError> {
        let Some(direction) = session.draft.direction else {
            return Ok(Step::Uncaptured);
        };
        let products = self.resolver.resolve_products(text).await?;

        if products.is_empty() {
            session.attempts += 1;
            if session.attempts > self.config.max_attempts {
                return Ok(Step::Exhausted);
            }
            ctx.push(MessageBody::QuickChoices {
                text: prompts::product_not_found(self.phrasing, text.trim()),
                choices: vec![QuickChoice::new("Yes", "YES"), QuickChoice::new("No", "NO")],
            });
            session.state = DialogueState::AskProductRetry;
            return Ok(Step::Continue);
        }

        ctx.say(self.phrasing.pick(prompts::FOUND_PRODUCTS));
        ctx.push(MessageBody::Cards(render::product_cards(
            &products,
            direction,
            self.config.image_base_url.as_deref(),
        )));
        session.products = products;
        self.enter(ctx, session, DialogueState::ChooseProduct);
        Ok(Step::Continue)
    }

    async fn on_product_retry(
        &self,
        ctx: &mut TurnCtx<'_>,
        session: &mut Session,
        answer: &str,
    ) -> Result<Step, AgrobotError> {
        if keywords::is_yes(answer) {
            ctx.say(self.phrasing.pick(prompts::RETRY_ACK));
            // Attempts carry over so the retry loop stays bounded.
            session.state = DialogueState::AskProduct;
            return Ok(self.ask(ctx, session));
        }
        if keywords::is_no(answer) {
            let preamble = self.phrasing.pick(prompts::NO_PROBLEM);
            *session = self.restart(ctx, Some(&*session), preamble).await;
            return Ok(Step::Continue);
        }
        Ok(Step::Uncaptured)
    }

    async fn on_product_choice(
        &self,
        ctx: &mut TurnCtx<'_>,
        session: &mut Session,
        code: &str,
    ) -> Result<Step, AgrobotError> {
        let Some(direction) = session.draft.direction else {
            return Ok(Step::Uncaptured);
        };
        if !session.products.iter().any(|p| p.code == code) {
            return Ok(Step::Uncaptured);
        }
        let Some(product) = self.resolver.product_by_code(code).await? else {
            return Ok(Step::Uncaptured);
        };
        let measurements = self.resolver.measurements_for(&product).await?;
        if measurements.is_empty() {
            warn!(product = product.code.as_str(), "product has no measurements");
            return Ok(Step::Uncaptured);
        }

        ctx.push(MessageBody::QuickChoices {
            text: prompts::ask_measurement(&product.name, direction),
            choices: measurements
                .iter()
                .map(|m| QuickChoice::new(m.name.clone(), m.code.clone()))
                .collect(),
        });
        session.draft.product = Some(product);
        session.products.clear();
        self.enter(ctx, session, DialogueState::AskMeasurement);
        Ok(Step::Continue)
    }

    async fn on_measurement(
        &self,
        ctx: &mut TurnCtx<'_>,
        session: &mut Session,
        code: &str,
    ) -> Result<Step, AgrobotError> {
        let Some(product) = session.draft.product.as_ref() else {
            return Ok(Step::Uncaptured);
        };
        let Some(measurement) = self.catalog.find_measurement_by_code(code).await? else {
            return Ok(Step::Uncaptured);
        };
        if !product.measurement_ids.contains(&measurement.id) {
            return Ok(Step::Uncaptured);
        }

        session.draft.measurement = Some(measurement);
        self.enter(ctx, session, DialogueState::AskQuantity);
        Ok(self.ask(ctx, session))
    }

    fn on_quantity(&self, ctx: &mut TurnCtx<'_>, session: &mut Session, text: &str) -> Step {
        let Some(quantity) = keywords::parse_quantity(text) else {
            return self.malformed(ctx, session);
        };
        session.draft.quantity = Some(quantity);
        self.enter(ctx, session, DialogueState::AskLocation);
        self.ask(ctx, session)
    }

    async fn on_location_share(
        &self,
        ctx: &mut TurnCtx<'_>,
        session: &mut Session,
        point: GeoPoint,
    ) -> Result<Step, AgrobotError> {
        let places = self.resolver.nearby_locations(point).await?;

        if places.is_empty() {
            session.attempts += 1;
            if session.attempts > self.config.max_attempts {
                return Ok(Step::Exhausted);
            }
            ctx.say(self.phrasing.pick(prompts::NO_PLACES));
            return Ok(self.ask(ctx, session));
        }

        ctx.push(MessageBody::QuickChoices {
            text: self.phrasing.pick(prompts::FOUND_PLACES).to_string(),
            choices: places
                .iter()
                .map(|l| QuickChoice::new(l.name.clone(), l.code.clone()))
                .collect(),
        });
        session.locations = places;
        session.shared_point = Some(point);
        self.enter(ctx, session, DialogueState::AskLocationRefine);
        Ok(Step::Continue)
    }

    async fn on_location_choice(
        &self,
        ctx: &mut TurnCtx<'_>,
        session: &mut Session,
        code: &str,
    ) -> Result<Step, AgrobotError> {
        let Some(point) = session.shared_point else {
            return Ok(Step::Uncaptured);
        };
        if !session.locations.iter().any(|l| l.code == code) {
            return Ok(Step::Uncaptured);
        }
        let Some(location) = self.resolver.location_by_code(code).await? else {
            return Ok(Step::Uncaptured);
        };

        session.draft.place(location, point);
        session.locations.clear();
        session.shared_point = None;
        self.enter(ctx, session, DialogueState::AskPrice);
        Ok(self.ask(ctx, session))
    }

    async fn on_price(
        &self,
        ctx: &mut TurnCtx<'_>,
        session: &mut Session,
        text: &str,
    ) -> Result<Step, AgrobotError> {
        let Some(price) = keywords::parse_price(text) else {
            return Ok(self.malformed(ctx, session));
        };
        session.draft.price = Some(price);

        if session.user.is_none() {
            ctx.say(prompts::PRE_ONBOARDING);
            self.enter(ctx, session, DialogueState::AskPhone);
            return Ok(self.ask(ctx, session));
        }
        self.submit(ctx, session).await
    }

    fn on_phone(&self, ctx: &mut TurnCtx<'_>, session: &mut Session, text: &str) -> Step {
        let Some(phone) = keywords::parse_phone(text) else {
            return self.malformed(ctx, session);
        };
        session.phone = Some(phone);
        self.enter(ctx, session, DialogueState::AskEmail);
        self.ask(ctx, session)
    }

    async fn on_email(
        &self,
        ctx: &mut TurnCtx<'_>,
        session: &mut Session,
        text: &str,
    ) -> Result<Step, AgrobotError> {
        let Some(email) = keywords::parse_email(text) else {
            return Ok(self.malformed(ctx, session));
        };
        let Some(phone) = session.phone.clone() else {
            return Ok(Step::Uncaptured);
        };
        let profile = self
            .profile(ctx, session.profile.clone())
            .await
            .unwrap_or_default();
        let new_user = NewUser {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            phone,
            email,
            subject_id: ctx.sender.to_string(),
            app_subject_id: None,
            picture_url: profile.picture_url.clone(),
            gender: profile.gender.clone(),
        };
        session.profile = Some(profile);

        let user = match self.catalog.insert_user(&new_user).await {
            Ok(user) => user,
            Err(AgrobotError::Conflict { field }) if field == "subject_id" => {
                // Registered from another conversation since this one began.
                match self.catalog.find_user_by_subject(ctx.sender).await? {
                    Some(user) => user,
                    None => return Err(AgrobotError::Conflict { field }),
                }
            }
            Err(AgrobotError::Conflict { field }) => {
                debug!(sender_id = ctx.sender, field = field.as_str(), "contact already taken");
                session.attempts += 1;
                if session.attempts > self.config.max_attempts {
                    return Ok(Step::Exhausted);
                }
                ctx.say(prompts::ALREADY_REGISTERED);
                session.phone = None;
                session.state = DialogueState::AskPhone;
                return Ok(Step::Continue);
            }
            Err(e) => return Err(e),
        };

        self.bind(session, user);
        self.submit(ctx, session).await
    }

    /// Persist the offer, search for counter-offers and present them.
    async fn submit(
        &self,
        ctx: &mut TurnCtx<'_>,
        session: &mut Session,
    ) -> Result<Step, AgrobotError> {
        session.state = DialogueState::Persisting;
        let Some(user_id) = session.user.as_ref().map(|u| u.id) else {
            return Ok(Step::Uncaptured);
        };
        let Some(new_offer) = session.draft.to_new_offer(user_id) else {
            return Ok(Step::Uncaptured);
        };

        let offer = self.catalog.insert_offer(&new_offer).await?;
        ctx.persisted = true;
        ctx.say(prompts::SEARCHING);

        session.state = DialogueState::Matching;
        let matches = self.matcher.find_matches(&offer).await?;
        let cards = render::offer_cards(self.catalog.as_ref(), &matches).await;

        if cards.is_empty() {
            ctx.say(prompts::NO_MATCH);
            ctx.say(self.phrasing.pick(prompts::GOODBYE));
            return Ok(Step::End);
        }

        ctx.say(self.phrasing.pick(prompts::FOUND_OFFERS));
        ctx.push(MessageBody::Cards(cards));
        session.offers = matches;
        self.enter(ctx, session, DialogueState::Presenting);
        Ok(Step::Continue)
    }

    async fn on_connect(
        &self,
        ctx: &mut TurnCtx<'_>,
        session: &mut Session,
        payload: &str,
    ) -> Result<Step, AgrobotError> {
        let Some(offer_id) = render::parse_connect(payload) else {
            return Ok(Step::Uncaptured);
        };
        if !session.offers.iter().any(|o| o.id == offer_id) {
            return Ok(Step::Uncaptured);
        }

        let owner = match self.catalog.find_offer(offer_id).await? {
            Some(offer) => self.catalog.find_user(offer.user_id).await?,
            None => None,
        };
        let contact = owner
            .as_ref()
            .and_then(|u| u.phone.clone().or_else(|| u.email.clone()).map(|c| (u, c)));
        let Some((owner, contact)) = contact else {
            ctx.say(prompts::OFFER_UNAVAILABLE);
            return Ok(Step::Continue);
        };

        info!(sender_id = ctx.sender, offer_id, "connected to counterparty");
        ctx.say(prompts::connect(&owner.full_name(), &contact));
        *session = Session::new(session.user.take(), session.profile.take());
        Ok(Step::Continue)
    }

    // --- Helpers ---

    fn enter(&self, ctx: &TurnCtx<'_>, session: &mut Session, state: DialogueState) {
        debug!(sender_id = ctx.sender, from = %session.state, to = %state, "state transition");
        session.enter(state);
    }

    fn bind(&self, session: &mut Session, user: User) {
        session.user = Some(user);
        session.phone = None;
    }

    fn ask_direction(&self, ctx: &mut TurnCtx<'_>, session: &mut Session) {
        ctx.push(MessageBody::QuickChoices {
            text: self.phrasing.pick(prompts::ASK_DIRECTION).to_string(),
            choices: vec![QuickChoice::new("Buy", "BUY"), QuickChoice::new("Sell", "SELL")],
        });
        session.enter(DialogueState::AskDirection);
    }

    /// Re-solicit the current question after an answer in the wrong format.
    fn malformed(&self, ctx: &mut TurnCtx<'_>, session: &mut Session) -> Step {
        session.attempts += 1;
        if session.attempts > self.config.max_attempts {
            return Step::Exhausted;
        }
        ctx.say(prompts::TRY_AGAIN);
        self.ask(ctx, session)
    }

    /// Send the question for the current state. Missing draft fields mean
    /// the session lost track, which is treated as uncaptured input.
    fn ask(&self, ctx: &mut TurnCtx<'_>, session: &Session) -> Step {
        match self.question(session) {
            Some(body) => {
                ctx.push(body);
                Step::Continue
            }
            None => Step::Uncaptured,
        }
    }

    fn question(&self, session: &Session) -> Option<MessageBody> {
        let draft = &session.draft;
        let body = match session.state {
            DialogueState::AskProduct => MessageBody::Text(prompts::ask_product(draft.direction?)),
            DialogueState::AskQuantity => MessageBody::Text(prompts::ask_quantity(
                &draft.measurement.as_ref()?.plural,
                &draft.product.as_ref()?.plural,
            )),
            DialogueState::AskLocation => MessageBody::LocationRequest {
                text: prompts::ask_location(draft.direction?, &draft.product.as_ref()?.plural),
            },
            DialogueState::AskPrice => MessageBody::Text(prompts::ask_price(
                &self.config.currency,
                draft.direction?,
                draft.quantity?,
                &draft.measurement.as_ref()?.plural,
                &draft.product.as_ref()?.plural,
            )),
            DialogueState::AskPhone => MessageBody::Text(prompts::ASK_PHONE.to_string()),
            DialogueState::AskEmail => MessageBody::Text(prompts::ASK_EMAIL.to_string()),
            _ => return None,
        };
        Some(body)
    }

    /// The sender's transport profile, fetched once per conversation.
    async fn profile(
        &self,
        ctx: &TurnCtx<'_>,
        known: Option<UserProfile>,
    ) -> Option<UserProfile> {
        if known.is_some() {
            return known;
        }
        match ctx.channel.fetch_profile(ctx.sender).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(sender_id = ctx.sender, error = %e, "profile fetch failed");
                None
            }
        }
    }
}

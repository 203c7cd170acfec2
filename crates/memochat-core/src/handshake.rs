use crate::config::EngineConfig;
use crate::directory::{Contact, ContactDirectory, OutgoingRequest, PendingContact};
use crate::error::EngineError;
use crate::event::EventBus;
use crate::identity::Identity;
use crate::memo::{self, MemoPayload};
use crate::monitor::OperationMonitor;
use crate::time::now_ms;
use crate::token::Token;
use memochat_api::types::{ContactDto, EngineEvent, PendingContactDto};
use memochat_api::validation::validate_address;

/// Two-phase request/accept exchange. Addresses are pseudonymous; the
/// exchanged tokens give both sides a stable routing key that survives
/// renames.
#[derive(Clone)]
pub struct Handshake {
    directory: ContactDirectory,
    monitor: OperationMonitor,
    events: EventBus,
    config: EngineConfig,
}

impl Handshake {
    pub fn new(
        directory: ContactDirectory,
        monitor: OperationMonitor,
        events: EventBus,
        config: EngineConfig,
    ) -> Self {
        Self {
            directory,
            monitor,
            events,
            config,
        }
    }

    /// Phase one: advertise ourselves to a peer address under a freshly
    /// minted token. The request record is persisted only once the
    /// operation confirms, so a failed send leaves nothing behind.
    pub async fn send_request(
        &self,
        identity: &Identity,
        peer_address: &str,
    ) -> Result<Token, EngineError> {
        validate_address(peer_address)?;
        if peer_address == identity.address {
            return Err(memochat_api::validation::ValidationError::Invalid("address").into());
        }
        if self.directory.contact_by_address(peer_address).await.is_some() {
            return Err(EngineError::AlreadyContact);
        }
        if self.directory.request_by_address(peer_address).await.is_some() {
            return Err(EngineError::AlreadyRequested);
        }
        if self.directory.pending_by_address(peer_address).await.is_some() {
            return Err(EngineError::AlreadyPending);
        }
        let my_token = Token::mint();
        let payload = MemoPayload::Request {
            category: identity.category.clone(),
            id: my_token.clone(),
            username: identity.username.clone(),
            address: identity.address.clone(),
        };
        let memo_hex = memo::encode(&payload).map_err(|_| EngineError::Encode)?;
        self.monitor
            .send(
                &identity.address,
                peer_address,
                self.config.dust,
                self.config.fee,
                &memo_hex,
            )
            .await?;
        self.directory
            .add_request(&OutgoingRequest {
                my_token: my_token.clone(),
                peer_address: peer_address.to_string(),
            })
            .await?;
        Ok(my_token)
    }

    /// Inbound `request` memo: banned senders are dropped, duplicates are
    /// ignored, everything else becomes a pending record for the user to
    /// confirm or reject.
    pub async fn handle_request(
        &self,
        category: &str,
        id: &Token,
        username: &str,
        address: &str,
    ) -> Result<(), EngineError> {
        if self.directory.is_banned(address).await {
            log::debug!("request from banned address {address}, dropping");
            return Ok(());
        }
        if self.directory.pending_by_token(id).await.is_some()
            || self.directory.pending_by_address(address).await.is_some()
            || self.directory.contact_by_token(id).await.is_some()
        {
            log::debug!("duplicate request from {address}, dropping");
            return Ok(());
        }
        let pending = PendingContact {
            category: category.to_string(),
            their_token: id.clone(),
            username: username.to_string(),
            address: address.to_string(),
        };
        self.directory.add_pending(&pending).await?;
        self.events
            .publish(EngineEvent::ContactRequested(pending_dto(&pending)));
        Ok(())
    }

    /// Phase two, confirming side: answer with an `identity` memo under a
    /// new token of our own, then promote the pending record to a contact.
    pub async fn confirm(
        &self,
        identity: &Identity,
        their_token: &Token,
    ) -> Result<Contact, EngineError> {
        let pending = self
            .directory
            .pending_by_token(their_token)
            .await
            .ok_or(EngineError::UnknownPending)?;
        let my_token = Token::mint();
        let payload = MemoPayload::Identity {
            category: identity.category.clone(),
            id: my_token.clone(),
            username: identity.username.clone(),
            address: identity.address.clone(),
        };
        let memo_hex = memo::encode(&payload).map_err(|_| EngineError::Encode)?;
        self.monitor
            .send(
                &identity.address,
                &pending.address,
                self.config.dust,
                self.config.fee,
                &memo_hex,
            )
            .await?;
        let contact = Contact {
            category: pending.category.clone(),
            my_token,
            their_token: pending.their_token.clone(),
            username: pending.username.clone(),
            address: pending.address.clone(),
            added_at_ms: now_ms(),
        };
        self.directory.delete_pending(their_token).await?;
        self.directory.add_contact(&contact).await?;
        self.events
            .publish(EngineEvent::ContactAdded(contact_dto(&contact)));
        Ok(contact)
    }

    /// Discard a pending request and ban its address. Nothing goes back on
    /// the wire; the requester's handshake simply never completes.
    pub async fn reject(&self, their_token: &Token) -> Result<(), EngineError> {
        let pending = self
            .directory
            .pending_by_token(their_token)
            .await
            .ok_or(EngineError::UnknownPending)?;
        self.directory.delete_pending(their_token).await?;
        self.directory.ban(&pending.address).await
    }

    /// Inbound `identity` memo: completes our outstanding request for that
    /// address. Unsolicited identity pushes are ignored.
    pub async fn handle_identity(
        &self,
        category: &str,
        id: &Token,
        username: &str,
        address: &str,
    ) -> Result<(), EngineError> {
        if self.directory.is_banned(address).await {
            log::debug!("identity memo from banned address {address}, dropping");
            return Ok(());
        }
        let Some(request) = self.directory.request_by_address(address).await else {
            log::debug!("unsolicited identity memo from {address}, dropping");
            return Ok(());
        };
        let contact = Contact {
            category: category.to_string(),
            my_token: request.my_token.clone(),
            their_token: id.clone(),
            username: username.to_string(),
            address: address.to_string(),
            added_at_ms: now_ms(),
        };
        self.directory.add_contact(&contact).await?;
        self.directory.delete_request(address).await?;
        self.events
            .publish(EngineEvent::ContactAdded(contact_dto(&contact)));
        Ok(())
    }
}

pub(crate) fn contact_dto(contact: &Contact) -> ContactDto {
    ContactDto {
        category: contact.category.clone(),
        my_token: contact.my_token.to_string(),
        their_token: contact.their_token.to_string(),
        username: contact.username.clone(),
        address: contact.address.clone(),
    }
}

pub(crate) fn pending_dto(pending: &PendingContact) -> PendingContactDto {
    PendingContactDto {
        category: pending.category.clone(),
        their_token: pending.their_token.to_string(),
        username: pending.username.clone(),
        address: pending.address.clone(),
    }
}

//! SubscriptionApi - typed access to the subscription and payment endpoints.
//!
//! Every call runs through the facade under its operation name. Plans and the
//! subscription record are decoded; the remaining endpoints hand back the
//! server's JSON untouched.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use super::operations;
use super::service_facade::ServiceFacade;
use crate::domain::foundation::{ServiceError, SubscriptionId};
use crate::domain::subscription::{Plan, PlanCatalog, Subscription};
use crate::ports::ApiRequest;

/// Client for `subscription/*` and `payment/*`.
pub struct SubscriptionApi {
    facade: Arc<ServiceFacade>,
}

impl SubscriptionApi {
    pub fn new(facade: Arc<ServiceFacade>) -> Self {
        Self { facade }
    }

    async fn call(&self, operation: &str, request: ApiRequest) -> Result<Value, ServiceError> {
        self.facade
            .execute(operation, |ctx| async move { ctx.send(request).await })
            .await
    }

    async fn call_as<T>(&self, operation: &str, request: ApiRequest) -> Result<T, ServiceError>
    where
        T: DeserializeOwned,
    {
        self.facade
            .execute(operation, |ctx| async move { ctx.send_as(request).await })
            .await
    }

    // ─── Plans ────────────────────────────────────────────────────────────────

    pub async fn plans(&self) -> Result<Vec<Plan>, ServiceError> {
        self.call_as(
            operations::GET_SUBSCRIPTION_PLANS,
            ApiRequest::get("subscription/plans"),
        )
        .await
    }

    pub async fn active_plans(&self) -> Result<Vec<Plan>, ServiceError> {
        self.call_as(
            operations::GET_ACTIVE_SUBSCRIPTION_PLANS,
            ApiRequest::get("subscription/plans/active"),
        )
        .await
    }

    pub async fn plan_by_name(&self, name: &str) -> Result<Plan, ServiceError> {
        self.call_as(
            operations::GET_SUBSCRIPTION_PLAN_BY_NAME,
            ApiRequest::get("subscription/plans/name").segment(name),
        )
        .await
    }

    /// Active plans arranged for the checkout page.
    pub async fn plan_catalog(&self) -> Result<PlanCatalog, ServiceError> {
        Ok(PlanCatalog::from_plans(self.active_plans().await?))
    }

    // ─── Subscription ─────────────────────────────────────────────────────────

    /// The caller's subscription, or `None` if they have never subscribed.
    pub async fn subscription_info(&self) -> Result<Option<Subscription>, ServiceError> {
        self.call_as(
            operations::GET_SUBSCRIPTION_INFO,
            ApiRequest::get("subscription/info"),
        )
        .await
    }

    /// Subscription created by the charge `imp_uid`.
    pub async fn subscription_details(
        &self,
        imp_uid: &str,
        email: Option<&str>,
    ) -> Result<Value, ServiceError> {
        let mut request = ApiRequest::get("subscription/details").query("imp_uid", imp_uid);
        if let Some(email) = email {
            request = request.query("email", email);
        }
        self.call(operations::GET_SUBSCRIPTION_DETAILS, request).await
    }

    pub async fn create_subscription(&self, subscription: Value) -> Result<Value, ServiceError> {
        self.call(
            operations::CREATE_SUBSCRIPTION,
            ApiRequest::post("subscription", subscription),
        )
        .await
    }

    pub async fn cancel_subscription(
        &self,
        subscription_id: &SubscriptionId,
        reason: &str,
    ) -> Result<Value, ServiceError> {
        let body = serde_json::json!({
            "subscription_id": subscription_id.as_str(),
            "reason": reason,
        });
        self.call(
            operations::CANCEL_SUBSCRIPTION,
            ApiRequest::post("subscription/cancel", body),
        )
        .await
    }

    pub async fn update_auto_renewal(
        &self,
        subscription_id: &SubscriptionId,
        auto_renewal: bool,
    ) -> Result<Value, ServiceError> {
        let request = ApiRequest::put("subscription")
            .segment(subscription_id.as_str())
            .segment("auto-renewal")
            .query("autoRenewal", auto_renewal.to_string());
        self.call(operations::UPDATE_AUTO_RENEWAL, request).await
    }

    pub async fn change_plan(
        &self,
        subscription_id: &SubscriptionId,
        plan_name: &str,
    ) -> Result<Value, ServiceError> {
        let request = ApiRequest::put("subscription")
            .segment(subscription_id.as_str())
            .segment("plan")
            .query("planName", plan_name);
        self.call(operations::CHANGE_PLAN, request).await
    }

    pub async fn change_payment_method(
        &self,
        subscription_id: &SubscriptionId,
        payment_method_id: &str,
    ) -> Result<Value, ServiceError> {
        let request = ApiRequest::put("subscription")
            .segment(subscription_id.as_str())
            .segment("payment-method")
            .query("paymentMethodId", payment_method_id);
        self.call(operations::CHANGE_PAYMENT_METHOD, request).await
    }

    // ─── Cancellations ────────────────────────────────────────────────────────

    pub async fn create_cancellation(&self, cancellation: Value) -> Result<Value, ServiceError> {
        self.call(
            operations::CREATE_CANCELLATION,
            ApiRequest::post("subscription/cancellation", cancellation),
        )
        .await
    }

    pub async fn cancellation_history(&self) -> Result<Value, ServiceError> {
        self.call(
            operations::GET_CANCELLATION_HISTORY,
            ApiRequest::get("subscription/cancellation"),
        )
        .await
    }

    pub async fn cancellation_detail(&self, cancellation_id: &str) -> Result<Value, ServiceError> {
        self.call(
            operations::GET_CANCELLATION_DETAIL,
            ApiRequest::get("subscription/cancellation").segment(cancellation_id),
        )
        .await
    }

    // ─── Payments ─────────────────────────────────────────────────────────────

    pub async fn payment_info(&self, payment_id: &str) -> Result<Value, ServiceError> {
        self.call(
            operations::GET_PAYMENT_INFO,
            ApiRequest::get("payment").segment(payment_id),
        )
        .await
    }

    pub async fn payment_receipt(&self, imp_uid: &str) -> Result<Value, ServiceError> {
        self.call(
            operations::GET_PAYMENT_RECEIPT,
            ApiRequest::get("payment/receipt").query("imp_uid", imp_uid),
        )
        .await
    }

    pub async fn refund_payment(&self, refund: Value) -> Result<Value, ServiceError> {
        self.call(
            operations::REFUND_PAYMENT,
            ApiRequest::post("payment/refund", refund),
        )
        .await
    }

    pub async fn register_payment_method(&self, method: Value) -> Result<Value, ServiceError> {
        self.call(
            operations::REGISTER_PAYMENT_METHOD,
            ApiRequest::post("payment/methods", method),
        )
        .await
    }

    pub async fn payment_methods(&self) -> Result<Value, ServiceError> {
        self.call(
            operations::GET_PAYMENT_METHODS,
            ApiRequest::get("payment/methods"),
        )
        .await
    }

    pub async fn delete_payment_method(&self, payment_method_id: &str) -> Result<Value, ServiceError> {
        self.call(
            operations::DELETE_PAYMENT_METHOD,
            ApiRequest::delete("payment/methods").segment(payment_method_id),
        )
        .await
    }

    pub async fn log_payment_action(&self, entry: Value) -> Result<Value, ServiceError> {
        self.call(
            operations::LOG_PAYMENT_ACTION,
            ApiRequest::post("payment/logs", entry),
        )
        .await
    }

    pub async fn payment_logs(&self) -> Result<Value, ServiceError> {
        self.call(operations::GET_PAYMENT_LOGS, ApiRequest::get("payment/logs"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::MockRequestExecutor;
    use crate::adapters::storage::InMemorySessionStorage;
    use crate::application::credential_manager::RefreshPolicy;
    use crate::application::session_store::SessionStore;
    use crate::domain::foundation::{ErrorKind, Timestamp};
    use crate::domain::session::PersistencePreference;
    use crate::domain::subscription::SubscriptionStatus;
    use crate::ports::HttpMethod;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn token() -> String {
        let claims = json!({
            "sub": "user@example.com",
            "exp": Timestamp::now().unix_seconds() + 3600,
        });
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"k")).unwrap()
    }

    async fn setup(signed_in: bool) -> (SubscriptionApi, Arc<MockRequestExecutor>) {
        let store = Arc::new(SessionStore::new(
            Arc::new(InMemorySessionStorage::new()),
            Arc::new(InMemorySessionStorage::new()),
        ));
        let facade = Arc::new(ServiceFacade::new(store, RefreshPolicy::default()));
        let executor = Arc::new(MockRequestExecutor::new());
        facade.complete_initialization(executor.clone()).unwrap();
        if signed_in {
            facade
                .login("user@example.com", &token(), "r1", PersistencePreference::Durable)
                .await
                .unwrap();
        }
        (SubscriptionApi::new(facade), executor)
    }

    fn plans_json() -> Value {
        json!([
            { "id": 1, "name": "Basic", "price": 5000, "durationMonths": 1,
              "maxLottoNumbers": 5, "features": "Save numbers" },
            { "id": 2, "name": "Standard", "price": 9000, "durationMonths": 1,
              "maxLottoNumbers": 20, "features": "Save numbers, Statistics" },
        ])
    }

    #[tokio::test]
    async fn plans_are_public_and_decoded() {
        let (api, executor) = setup(false).await;
        executor.respond(HttpMethod::Get, "subscription/plans/active", Ok(plans_json()));

        let catalog = api.plan_catalog().await.unwrap();

        assert_eq!(catalog.offers().len(), 2);
        assert_eq!(catalog.default_selection().unwrap().plan.key(), "standard");
        let basic = catalog.get("basic").unwrap();
        assert_eq!(basic.not_included, vec!["Statistics".to_string()]);
    }

    #[tokio::test]
    async fn plan_by_name_encodes_the_name() {
        let (api, executor) = setup(false).await;
        executor.respond(
            HttpMethod::Get,
            "subscription/plans/name/Gold Plus",
            Ok(json!({ "data": { "id": 3, "name": "Gold Plus", "price": 12000, "durationMonths": 1 } })),
        );

        let plan = api.plan_by_name("Gold Plus").await.unwrap();

        assert_eq!(plan.name, "Gold Plus");
        let call = executor.last_call_to("subscription/plans/name/Gold Plus").unwrap();
        assert_eq!(call.segments().last().map(String::as_str), Some("Gold Plus"));
    }

    #[tokio::test]
    async fn subscription_info_requires_session() {
        let (api, executor) = setup(false).await;

        let err = api.subscription_info().await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::AuthRequired);
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn subscription_info_decodes_record_or_nothing() {
        let (api, executor) = setup(true).await;
        executor.respond_once(
            HttpMethod::Get,
            "subscription/info",
            Ok(json!({ "data": {
                "id": 11, "userEmail": "user@example.com", "planName": "standard",
                "status": "ACTIVE", "autoRenewal": true
            } })),
        );
        executor.respond_once(HttpMethod::Get, "subscription/info", Ok(json!({ "data": null })));

        let info = api.subscription_info().await.unwrap().unwrap();
        assert_eq!(info.subscription_id.as_str(), "11");
        assert_eq!(info.status, SubscriptionStatus::Active);
        assert!(info.auto_renewal);

        assert!(api.subscription_info().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cancel_posts_id_and_reason() {
        let (api, executor) = setup(true).await;
        executor.respond(HttpMethod::Post, "subscription/cancel", Ok(json!({ "success": true })));
        let id = SubscriptionId::new("11").unwrap();

        api.cancel_subscription(&id, "too expensive").await.unwrap();

        let call = executor.last_call_to("subscription/cancel").unwrap();
        assert_eq!(
            call.body,
            Some(json!({ "subscription_id": "11", "reason": "too expensive" }))
        );
    }

    #[tokio::test]
    async fn mutations_use_path_and_query() {
        let (api, executor) = setup(true).await;
        let id = SubscriptionId::new("11").unwrap();
        executor.respond(HttpMethod::Put, "subscription/11/auto-renewal", Ok(Value::Null));
        executor.respond(HttpMethod::Put, "subscription/11/plan", Ok(Value::Null));
        executor.respond(HttpMethod::Get, "subscription/details", Ok(json!({})));

        api.update_auto_renewal(&id, false).await.unwrap();
        api.change_plan(&id, "premium").await.unwrap();
        api.subscription_details("imp_1", Some("user@example.com")).await.unwrap();

        let renewal = executor.last_call_to("subscription/11/auto-renewal").unwrap();
        assert_eq!(renewal.query, vec![("autoRenewal".to_string(), "false".to_string())]);
        let plan = executor.last_call_to("subscription/11/plan").unwrap();
        assert_eq!(plan.query, vec![("planName".to_string(), "premium".to_string())]);
        let details = executor.last_call_to("subscription/details").unwrap();
        assert_eq!(details.query.len(), 2);
    }

    #[tokio::test]
    async fn payment_methods_round_trip_raw_json() {
        let (api, executor) = setup(true).await;
        executor.respond(
            HttpMethod::Get,
            "payment/methods",
            Ok(json!({ "data": [{ "id": 3, "cardName": "Shinhan" }] })),
        );
        executor.respond(HttpMethod::Delete, "payment/methods/3", Ok(Value::Null));

        let methods = api.payment_methods().await.unwrap();
        assert_eq!(methods["data"][0]["id"], 3);

        api.delete_payment_method("3").await.unwrap();
        assert_eq!(executor.calls_to("payment/methods/3"), 1);
    }
}

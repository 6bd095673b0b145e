use sqlguard_ast::SqlContext;

/// One link in the inner-interceptor chain (spec §4.5). Priority bands:
/// 1-99 check interceptors, 100-199 fallback rewriters, 200+ user/rewrite
/// interceptors. `will_do_*` returning `false` short-circuits the remainder
/// of the chain for the current operation; `before_*` may rewrite the
/// outgoing SQL, but only meaningfully at priority >= 100 (an earlier
/// interceptor's rewrite would be invisible to later checks).
pub trait InnerInterceptor: Send + Sync {
    fn priority(&self) -> u32;

    fn will_do_query(&self, _ctx: &mut SqlContext) -> bool {
        true
    }

    fn before_query(&self, sql: String, _ctx: &mut SqlContext) -> String {
        sql
    }

    fn will_do_update(&self, _ctx: &mut SqlContext) -> bool {
        true
    }

    fn before_update(&self, sql: String, _ctx: &mut SqlContext) -> String {
        sql
    }
}

//! In-memory record store backed by DashMap.

use adlaunch_core::records::{AdRecordSink, LocalAdRecord, LocalAdSetRecord, LocalCampaignRecord};
use adlaunch_core::{LaunchError, LaunchResult};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::*;

/// Thread-safe store for brands, customer profiles and local copies of
/// campaigns, ad sets and ads created on the platform.
pub struct RecordStore {
    brands: DashMap<Uuid, Brand>,
    profiles: DashMap<Uuid, CustomerProfile>,
    campaigns: DashMap<String, LocalCampaignRecord>,
    ad_sets: DashMap<String, LocalAdSetRecord>,
    ads: DashMap<String, LocalAdRecord>,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    pub fn new() -> Self {
        info!("Record store initialized (in-memory)");
        Self {
            brands: DashMap::new(),
            profiles: DashMap::new(),
            campaigns: DashMap::new(),
            ad_sets: DashMap::new(),
            ads: DashMap::new(),
        }
    }

    // ─── Brands ────────────────────────────────────────────────────────────

    pub fn list_brands(&self) -> Vec<Brand> {
        let mut brands: Vec<Brand> = self.brands.iter().map(|r| r.value().clone()).collect();
        brands.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        brands
    }

    pub fn get_brand(&self, id: Uuid) -> Option<Brand> {
        self.brands.get(&id).map(|r| r.value().clone())
    }

    pub fn create_brand(&self, req: CreateBrandRequest) -> Brand {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let brand = Brand {
            id,
            name: req.name,
            logo: req.logo,
            colors: req.colors,
            voice: req.voice,
            products: to_products(id, req.products),
            profile_ids: self.known_profiles(req.profile_ids),
            created_at: now,
            updated_at: now,
        };
        self.brands.insert(id, brand.clone());
        debug!(brand_id = %id, products = brand.products.len(), "Brand created");
        brand
    }

    pub fn update_brand(&self, id: Uuid, req: UpdateBrandRequest) -> Option<Brand> {
        let profile_ids = req.profile_ids.map(|ids| self.known_profiles(ids));
        self.brands.get_mut(&id).map(|mut entry| {
            let b = entry.value_mut();
            if let Some(name) = req.name { b.name = name; }
            if let Some(logo) = req.logo { b.logo = Some(logo); }
            if let Some(colors) = req.colors { b.colors = colors; }
            if let Some(voice) = req.voice { b.voice = Some(voice); }
            if let Some(products) = req.products { b.products = to_products(id, products); }
            if let Some(ids) = profile_ids { b.profile_ids = ids; }
            b.updated_at = Utc::now();
            b.clone()
        })
    }

    /// Removes the brand together with its products.
    pub fn delete_brand(&self, id: Uuid) -> bool {
        self.brands.remove(&id).is_some()
    }

    // ─── Products ──────────────────────────────────────────────────────────

    pub fn list_products(&self, brand_id: Uuid) -> Option<Vec<Product>> {
        self.brands.get(&brand_id).map(|r| r.value().products.clone())
    }

    pub fn get_product(&self, id: Uuid) -> Option<Product> {
        self.brands
            .iter()
            .find_map(|r| r.value().products.iter().find(|p| p.id == id).cloned())
    }

    /// `None` when the brand does not exist.
    pub fn create_product(&self, brand_id: Uuid, input: ProductInput) -> Option<Product> {
        self.brands.get_mut(&brand_id).map(|mut entry| {
            let brand = entry.value_mut();
            let product = Product {
                id: Uuid::new_v4(),
                brand_id,
                name: input.name,
                description: input.description,
            };
            brand.products.push(product.clone());
            brand.updated_at = Utc::now();
            debug!(brand_id = %brand_id, product_id = %product.id, "Product created");
            product
        })
    }

    pub fn update_product(&self, id: Uuid, req: UpdateProductRequest) -> Option<Product> {
        let mut entry = self
            .brands
            .iter_mut()
            .find(|r| r.value().products.iter().any(|p| p.id == id))?;
        let brand = entry.value_mut();
        let p = brand.products.iter_mut().find(|p| p.id == id)?;
        if let Some(name) = req.name { p.name = name; }
        if let Some(description) = req.description { p.description = Some(description); }
        let updated = p.clone();
        brand.updated_at = Utc::now();
        Some(updated)
    }

    pub fn delete_product(&self, id: Uuid) -> bool {
        for mut entry in self.brands.iter_mut() {
            let brand = entry.value_mut();
            let before = brand.products.len();
            brand.products.retain(|p| p.id != id);
            if brand.products.len() != before {
                brand.updated_at = Utc::now();
                return true;
            }
        }
        false
    }

    // ─── Customer profiles ─────────────────────────────────────────────────

    pub fn list_profiles(&self) -> Vec<CustomerProfile> {
        let mut profiles: Vec<CustomerProfile> = self.profiles.iter().map(|r| r.value().clone()).collect();
        profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        profiles
    }

    pub fn get_profile(&self, id: Uuid) -> Option<CustomerProfile> {
        self.profiles.get(&id).map(|r| r.value().clone())
    }

    pub fn create_profile(&self, req: CreateProfileRequest) -> CustomerProfile {
        let now = Utc::now();
        let profile = CustomerProfile {
            id: Uuid::new_v4(),
            name: req.name,
            demographics: req.demographics,
            pain_points: req.pain_points,
            goals: req.goals,
            created_at: now,
            updated_at: now,
        };
        self.profiles.insert(profile.id, profile.clone());
        profile
    }

    pub fn update_profile(&self, id: Uuid, req: UpdateProfileRequest) -> Option<CustomerProfile> {
        self.profiles.get_mut(&id).map(|mut entry| {
            let p = entry.value_mut();
            if let Some(name) = req.name { p.name = name; }
            if let Some(demographics) = req.demographics { p.demographics = demographics; }
            if let Some(pain_points) = req.pain_points { p.pain_points = pain_points; }
            if let Some(goals) = req.goals { p.goals = goals; }
            p.updated_at = Utc::now();
            p.clone()
        })
    }

    /// Removes the profile and unlinks it from every brand.
    pub fn delete_profile(&self, id: Uuid) -> bool {
        let removed = self.profiles.remove(&id).is_some();
        if removed {
            for mut brand in self.brands.iter_mut() {
                brand.value_mut().profile_ids.retain(|p| *p != id);
            }
        }
        removed
    }

    fn known_profiles(&self, ids: Vec<Uuid>) -> Vec<Uuid> {
        let mut known = Vec::with_capacity(ids.len());
        for id in ids {
            if self.profiles.contains_key(&id) && !known.contains(&id) {
                known.push(id);
            }
        }
        known
    }

    // ─── Campaign and ad set records ───────────────────────────────────────

    pub fn list_campaigns(&self) -> Vec<LocalCampaignRecord> {
        let mut campaigns: Vec<LocalCampaignRecord> = self.campaigns.iter().map(|r| r.value().clone()).collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        campaigns
    }

    pub fn get_campaign(&self, id: &str) -> Option<LocalCampaignRecord> {
        self.campaigns.get(id).map(|r| r.value().clone())
    }

    /// Returns `true` when stored, `false` when a record with this id already
    /// exists. The existing record is left untouched.
    pub fn save_campaign(&self, record: LocalCampaignRecord) -> LaunchResult<bool> {
        if record.id.trim().is_empty() {
            return Err(LaunchError::LocalPersistence("campaign record id must not be empty".into()));
        }
        match self.campaigns.entry(record.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(false),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(true)
            }
        }
    }

    pub fn list_ad_sets(&self, campaign_id: Option<&str>) -> Vec<LocalAdSetRecord> {
        let mut ad_sets: Vec<LocalAdSetRecord> = self
            .ad_sets
            .iter()
            .filter(|r| campaign_id.map_or(true, |c| r.value().campaign_id == c))
            .map(|r| r.value().clone())
            .collect();
        ad_sets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        ad_sets
    }

    pub fn get_ad_set(&self, id: &str) -> Option<LocalAdSetRecord> {
        self.ad_sets.get(id).map(|r| r.value().clone())
    }

    /// Same contract as `save_campaign`. The parent campaign id is required
    /// but need not be stored locally.
    pub fn save_ad_set(&self, record: LocalAdSetRecord) -> LaunchResult<bool> {
        if record.id.trim().is_empty() {
            return Err(LaunchError::LocalPersistence("ad set record id must not be empty".into()));
        }
        if record.campaign_id.trim().is_empty() {
            return Err(LaunchError::LocalPersistence(format!(
                "ad set record {} has no campaign id",
                record.id
            )));
        }
        match self.ad_sets.entry(record.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(false),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(true)
            }
        }
    }

    // ─── Ad records ────────────────────────────────────────────────────────

    pub fn list_ads(&self) -> Vec<LocalAdRecord> {
        let mut ads: Vec<LocalAdRecord> = self.ads.iter().map(|r| r.value().clone()).collect();
        ads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        ads
    }

    pub fn list_ads_for_ad_set(&self, ad_set_id: &str) -> Vec<LocalAdRecord> {
        let mut ads: Vec<LocalAdRecord> = self
            .ads
            .iter()
            .filter(|r| r.value().ad_set_id == ad_set_id)
            .map(|r| r.value().clone())
            .collect();
        ads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        ads
    }

    pub fn insert_ad(&self, record: LocalAdRecord) -> LaunchResult<()> {
        if record.id.trim().is_empty() {
            return Err(LaunchError::LocalPersistence("ad record id must not be empty".into()));
        }
        match self.ads.entry(record.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(LaunchError::LocalPersistence(format!(
                "ad record {} already exists",
                record.id
            ))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    /// Insert each record independently; one rejected record does not block the rest.
    pub fn insert_ads(&self, records: Vec<LocalAdRecord>) -> Vec<InsertedRecord> {
        records
            .into_iter()
            .map(|record| {
                let id = record.id.clone();
                let success = self.insert_ad(record).is_ok();
                InsertedRecord { id, success }
            })
            .collect()
    }

    pub fn ad_count(&self) -> usize {
        self.ads.len()
    }
}

fn to_products(brand_id: Uuid, inputs: Vec<ProductInput>) -> Vec<Product> {
    inputs
        .into_iter()
        .map(|p| Product {
            id: Uuid::new_v4(),
            brand_id,
            name: p.name,
            description: p.description,
        })
        .collect()
}

#[async_trait]
impl AdRecordSink for RecordStore {
    async fn persist(&self, record: LocalAdRecord) -> LaunchResult<()> {
        self.insert_ad(record)?;
        metrics::counter!("store.ads.persisted").increment(1);
        Ok(())
    }

    async fn persist_campaign(&self, record: LocalCampaignRecord) -> LaunchResult<()> {
        if self.save_campaign(record)? {
            metrics::counter!("store.campaigns.persisted").increment(1);
        }
        Ok(())
    }

    async fn persist_ad_set(&self, record: LocalAdSetRecord) -> LaunchResult<()> {
        if self.save_ad_set(record)? {
            metrics::counter!("store.ad_sets.persisted").increment(1);
        }
        Ok(())
    }
}

//! Solidity interfaces of the protocol contracts
//!
//! Function names, argument types and argument order must match the
//! deployed ABIs exactly: they determine the 4-byte selectors.

#![allow(clippy::too_many_arguments)]

use alloy_sol_types::sol;

sol! {
    // ============================================
    // SHARED STRUCTS
    // ============================================

    #[derive(Debug, Default, PartialEq, Eq)]
    struct ProviderFee {
        address providerFeeAddress;
        address providerFeeToken;
        uint256 providerFeeAmount;
        uint8 v;
        bytes32 r;
        bytes32 s;
        uint256 validUntil;
        bytes providerData;
    }

    #[derive(Debug, Default, PartialEq, Eq)]
    struct ConsumeMarketFee {
        address consumeMarketFeeAddress;
        address consumeMarketFeeToken;
        uint256 consumeMarketFeeAmount;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Template {
        address templateAddress;
        bool isActive;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct NftCreateData {
        string name;
        string symbol;
        uint256 templateIndex;
        string tokenURI;
        bool transferable;
        address owner;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct ErcCreateData {
        uint256 templateIndex;
        string[] strings;
        address[] addresses;
        uint256[] uints;
        bytes[] bytess;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct FixedData {
        address fixedPriceAddress;
        address[] addresses;
        uint256[] uints;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct DispenserData {
        address dispenserAddress;
        uint256 maxTokens;
        uint256 maxBalance;
        bool withMint;
        address allowedSwapper;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct TokenOrder {
        address tokenAddress;
        address consumer;
        uint256 serviceIndex;
        ProviderFee providerFee;
        ConsumeMarketFee consumeMarketFee;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct OrderParams {
        address consumer;
        uint256 serviceIndex;
        ProviderFee providerFee;
        ConsumeMarketFee consumeMarketFee;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct FreParams {
        address exchangeContract;
        bytes32 exchangeId;
        uint256 maxBaseTokenAmount;
        uint256 swapMarketFee;
        address marketFeeAddress;
    }

    #[derive(Debug, Default, PartialEq, Eq)]
    struct NftRoles {
        bool manager;
        bool deployERC20;
        bool updateMetadata;
        bool store;
    }

    #[derive(Debug, Default, PartialEq, Eq)]
    struct DatatokenRoles {
        bool minter;
        bool paymentManager;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct MetaDataProof {
        address validatorAddress;
        uint8 v;
        bytes32 r;
        bytes32 s;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct MetaDataAndTokenURI {
        uint8 metaDataState;
        string metaDataDecryptorUrl;
        string metaDataDecryptorAddress;
        bytes flags;
        bytes data;
        bytes32 metaDataHash;
        uint256 tokenId;
        string tokenURI;
        MetaDataProof[] metadataProofs;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct FixedRateInfo {
        address contractAddress;
        bytes32 id;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Operation {
        bytes32 exchangeIds;
        address source;
        uint8 operation;
        address tokenIn;
        uint256 amountsIn;
        address tokenOut;
        uint256 amountsOut;
        uint256 maxPrice;
        uint256 swapMarketFee;
        address marketFeeAddress;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Authorization {
        address payee;
        uint256 maxLockedAmount;
        uint256 currentLockedAmount;
        uint256 maxLockSeconds;
        uint256 maxLockCounts;
        uint256 currentLocks;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct EscrowLock {
        uint256 jobId;
        address payer;
        address payee;
        uint256 amount;
        uint256 expiry;
        address token;
    }

    // ============================================
    // TOKENS
    // ============================================

    interface IERC20 {
        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address to, uint256 amount) external returns (bool);
    }

    /// Datatoken templates 1, 2 and 4 share this surface
    interface IERC20Template {
        function mint(address account, uint256 value) external;
        function addMinter(address minter) external;
        function removeMinter(address minter) external;
        function addPaymentManager(address paymentManager) external;
        function removePaymentManager(address paymentManager) external;
        function setPaymentCollector(address paymentCollector) external;
        function getPaymentCollector() external view returns (address);
        function cleanPermissions() external;
        function getPermissions(address user) external view returns (DatatokenRoles memory);
        function getERC721Address() external view returns (address);
        function isERC20Deployer(address user) external view returns (bool);
        function cap() external view returns (uint256);
        function getId() external pure returns (uint8);
        function setData(bytes calldata value) external;
        function createFixedRate(address fixedPriceAddress, address[] memory addresses, uint256[] memory uints) external returns (bytes32 exchangeId);
        function createDispenser(address dispenser, uint256 maxTokens, uint256 maxBalance, bool withMint, address allowedSwapper) external;
        function startOrder(address consumer, uint256 serviceIndex, ProviderFee calldata providerFee, ConsumeMarketFee calldata consumeMarketFee) external;
        function reuseOrder(bytes32 orderTxId, ProviderFee calldata providerFee) external;
        function setPublishingMarketFee(address publishMarketFeeAddress, address publishMarketFeeToken, uint256 publishMarketFeeAmount) external;
        function getPublishingMarketFee() external view returns (address publishMarketFeeAddress, address publishMarketFeeToken, uint256 publishMarketFeeAmount);
        function getFixedRates() external view returns (FixedRateInfo[] memory);
        function getDispensers() external view returns (address[] memory);

        event OrderStarted(address indexed consumer, address payer, uint256 amount, uint256 serviceIndex, uint256 timestamp, address indexed publishMarketAddress, uint256 blockNumber);
        event NewFixedRate(bytes32 exchangeId, address indexed owner, address exchangeContract, address indexed baseToken);
    }

    /// Template 2 only
    interface IERC20TemplateEnterprise {
        function buyFromFreAndOrder(OrderParams calldata orderParams, FreParams calldata freParams) external;
        function buyFromDispenserAndOrder(OrderParams calldata orderParams, address dispenserContract) external;
    }

    /// Template 4 only
    interface IERC20Template4 {
        function setAllowListContract(address allowListContract) external;
        function setDenyListContract(address denyListContract) external;
        function getAllowListContract() external view returns (address);
        function getDenyListContract() external view returns (address);
        function setFileObject(bytes calldata fileObject) external;
    }

    // ============================================
    // NFT + FACTORY
    // ============================================

    interface IERC721Template {
        function createERC20(uint256 templateIndex, string[] calldata strings, address[] calldata addresses, uint256[] calldata uints, bytes[] calldata bytess) external returns (address);
        function addManager(address manager) external;
        function removeManager(address manager) external;
        function addToCreateERC20List(address user) external;
        function removeFromCreateERC20List(address user) external;
        function addToMetadataList(address user) external;
        function removeFromMetadataList(address user) external;
        function addTo725StoreList(address user) external;
        function removeFrom725StoreList(address user) external;
        function cleanPermissions() external;
        function transferFrom(address from, address to, uint256 tokenId) external;
        function safeTransferFrom(address from, address to, uint256 tokenId) external;
        function setMetaData(uint8 metaDataState, string calldata metaDataDecryptorUrl, string calldata metaDataDecryptorAddress, bytes calldata flags, bytes calldata data, bytes32 metaDataHash, MetaDataProof[] memory metadataProofs) external;
        function setMetaDataState(uint8 metaDataState) external;
        function setMetaDataAndTokenURI(MetaDataAndTokenURI calldata metaDataAndTokenURI) external;
        function setTokenURI(uint256 tokenId, string memory tokenURI) external;
        function getMetaData() external view returns (string memory metaDataDecryptorUrl, string memory metaDataDecryptorAddress, uint8 metaDataState, bool hasMetaData);
        function getPermissions(address user) external view returns (NftRoles memory);
        function ownerOf(uint256 tokenId) external view returns (address);
        function getTokensList() external view returns (address[] memory);
        function isDeployed(address datatoken) external view returns (bool);
        function setNewData(bytes32 key, bytes calldata value) external;
        function getData(bytes32 key) external view returns (bytes memory);
        function tokenURI(uint256 tokenId) external view returns (string memory);

        event TokenCreated(address indexed newTokenAddress, address indexed templateAddress, string name, string symbol, uint256 cap, address creator);
        event MetadataCreated(address indexed createdBy, uint8 state, string decryptorUrl, bytes flags, bytes data, bytes32 metaDataHash, uint256 timestamp, uint256 blockNumber);
    }

    interface IERC721Factory {
        function deployERC721Contract(string memory name, string memory symbol, uint256 templateIndex, address additionalERC20Deployer, address additionalMetaDataUpdater, string memory tokenURI, bool transferable, address owner) external returns (address token);
        function getCurrentNFTCount() external view returns (uint256);
        function getCurrentTokenCount() external view returns (uint256);
        function getCurrentNFTTemplateCount() external view returns (uint256);
        function getCurrentTemplateCount() external view returns (uint256);
        function getNFTTemplate(uint256 index) external view returns (Template memory);
        function getTokenTemplate(uint256 index) external view returns (Template memory);
        function erc20List(address datatoken) external view returns (bool);
        function erc721List(address nft) external view returns (address);
        function owner() external view returns (address);
        function add721TokenTemplate(address templateAddress) external returns (uint256);
        function disable721TokenTemplate(uint256 templateIndex) external;
        function reactivate721TokenTemplate(uint256 templateIndex) external;
        function addTokenTemplate(address templateAddress) external returns (uint256);
        function disableTokenTemplate(uint256 templateIndex) external;
        function reactivateTokenTemplate(uint256 templateIndex) external;
        function startMultipleTokenOrder(TokenOrder[] memory orders) external;
        function createNftWithErc20(NftCreateData calldata nftCreateData, ErcCreateData calldata ercCreateData) external returns (address erc721Address, address erc20Address);
        function createNftWithErc20WithFixedRate(NftCreateData calldata nftCreateData, ErcCreateData calldata ercCreateData, FixedData calldata fixedData) external returns (address erc721Address, address erc20Address, bytes32 exchangeId);
        function createNftWithErc20WithDispenser(NftCreateData calldata nftCreateData, ErcCreateData calldata ercCreateData, DispenserData calldata dispenserData) external returns (address erc721Address, address erc20Address);

        event NFTCreated(address newTokenAddress, address indexed templateAddress, string eventName, address indexed admin, string symbol, string tokenURI, bool transferable, address indexed creator);
    }

    // ============================================
    // EXCHANGES
    // ============================================

    interface IFixedRateExchange {
        function buyDT(bytes32 exchangeId, uint256 datatokenAmount, uint256 maxBaseTokenAmount, address consumeMarketAddress, uint256 consumeMarketSwapFeeAmount) external;
        function sellDT(bytes32 exchangeId, uint256 datatokenAmount, uint256 minBaseTokenAmount, address consumeMarketAddress, uint256 consumeMarketSwapFeeAmount) external;
        function getNumberOfExchanges() external view returns (uint256);
        function setRate(bytes32 exchangeId, uint256 newRate) external;
        function setAllowedSwapper(bytes32 exchangeId, address newAllowedSwapper) external;
        function toggleExchangeState(bytes32 exchangeId) external;
        function toggleMintState(bytes32 exchangeId, bool withMint) external;
        function getRate(bytes32 exchangeId) external view returns (uint256);
        function getDTSupply(bytes32 exchangeId) external view returns (uint256);
        function getBTSupply(bytes32 exchangeId) external view returns (uint256);
        function getAllowedSwapper(bytes32 exchangeId) external view returns (address);
        function getExchange(bytes32 exchangeId) external view returns (address exchangeOwner, address datatoken, uint256 dtDecimals, address baseToken, uint256 btDecimals, uint256 fixedRate, bool active, uint256 dtSupply, uint256 btSupply, uint256 dtBalance, uint256 btBalance, bool withMint, address allowedSwapper);
        function getFeesInfo(bytes32 exchangeId) external view returns (uint256 marketFee, address marketFeeCollector, uint256 opcFee, uint256 marketFeeAvailable, uint256 oceanFeeAvailable);
        function getExchanges() external view returns (bytes32[] memory);
        function isActive(bytes32 exchangeId) external view returns (bool);
        function collectBT(bytes32 exchangeId, uint256 amount) external;
        function collectDT(bytes32 exchangeId, uint256 amount) external;
        function collectMarketFee(bytes32 exchangeId) external;
        function collectOceanFee(bytes32 exchangeId) external;
        function updateMarketFeeCollector(bytes32 exchangeId, address newMarketCollector) external;
        function updateMarketFee(bytes32 exchangeId, uint256 newMarketFee) external;
        function getRouter() external view returns (address);
        function calcBaseInGivenOutDT(bytes32 exchangeId, uint256 datatokenAmount, uint256 consumeMarketSwapFeeAmount) external view returns (uint256 baseTokenAmount, uint256 oceanFeeAmount, uint256 publishMarketFeeAmount, uint256 consumeMarketFeeAmount);
        function calcBaseOutGivenInDT(bytes32 exchangeId, uint256 datatokenAmount, uint256 consumeMarketSwapFeeAmount) external view returns (uint256 baseTokenAmount, uint256 oceanFeeAmount, uint256 publishMarketFeeAmount, uint256 consumeMarketFeeAmount);
        function generateExchangeId(address baseToken, address datatoken) external pure returns (bytes32);
    }

    interface IDispenser {
        function status(address datatoken) external view returns (bool active, address owner, bool isMinter, uint256 maxTokens, uint256 maxBalance, uint256 balance, address allowedSwapper);
        function create(address datatoken, uint256 maxTokens, uint256 maxBalance, address owner, address allowedSwapper) external;
        function activate(address datatoken, uint256 maxTokens, uint256 maxBalance) external;
        function deactivate(address datatoken) external;
        function setAllowedSwapper(address datatoken, address newAllowedSwapper) external;
        function dispense(address datatoken, uint256 amount, address destination) external payable;
        function ownerWithdraw(address datatoken) external;

        event DispenserCreated(address indexed datatokenAddress, address indexed owner, uint256 maxTokens, uint256 maxBalance, address destination);
    }

    interface IFactoryRouter {
        function buyDTBatch(Operation[] calldata operations) external;
        function isApprovedToken(address token) external view returns (bool);
        function routerOwner() external view returns (address);
        function factory() external view returns (address);
        function isFixedRateContract(address contractAddress) external view returns (bool);
        function isDispenserContract(address contractAddress) external view returns (bool);
        function getOPCFee(address baseToken) external view returns (uint256);
        function getOPCFees() external view returns (uint256 swapOceanFee, uint256 swapNonOceanFee);
        function getOPCConsumeFee() external view returns (uint256);
        function getOPCProviderFee() external view returns (uint256);
        function addApprovedToken(address token) external;
        function removeApprovedToken(address token) external;
        function addFixedRateContract(address fixedRate) external;
        function removeFixedRateContract(address fixedRate) external;
        function addDispenserContract(address dispenser) external;
        function removeDispenserContract(address dispenser) external;
        function updateOPCFee(uint256 newSwapOceanFee, uint256 newSwapNonOceanFee, uint256 newConsumeFee, uint256 newProviderFee) external;
    }

    // ============================================
    // ACCESS LISTS + ESCROW
    // ============================================

    interface IAccessList {
        function mint(address user, string memory tokenURI) external returns (uint256);
        function batchMint(address[] memory user, string[] memory tokenURI) external;
        function burn(uint256 tokenId) external;
        function transferOwnership(address newOwner) external;
        function renounceOwnership() external;
        function owner() external view returns (address);
        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function tokenURI(uint256 tokenId) external view returns (string memory);
        function balanceOf(address user) external view returns (uint256);
    }

    interface IAccessListFactory {
        function deployAccessListContract(string memory name, string memory symbol, bool transferable, address owner, address[] memory user, string[] memory tokenURI) external returns (address);
        function isDeployed(address contractAddress) external view returns (bool);
        function changeTemplateAddress(address newTemplate) external;
        function owner() external view returns (address);

        event NewAccessList(address indexed contractAddress, address indexed owner);
    }

    interface IEscrow {
        function deposit(address token, uint256 amount) external;
        function withdraw(address[] calldata tokens, uint256[] calldata amounts) external;
        function authorize(address token, address payee, uint256 maxLockedAmount, uint256 maxLockSeconds, uint256 maxLockCounts) external;
        function getFunds(address token) external view returns (uint256 available, uint256 locked);
        function getUserFunds(address payer, address token) external view returns (uint256 available, uint256 locked);
        function getUserTokens(address payer) external view returns (address[] memory);
        function getLocks(address token, address payer, address payee) external view returns (EscrowLock[] memory);
        function getAuthorizations(address token, address payer, address payee) external view returns (Authorization[] memory);
    }

    // ============================================
    // VOTE-ESCROW + DATA FARMING
    // ============================================

    interface IVeOcean {
        function create_lock(uint256 value, uint256 unlockTime) external;
        function increase_amount(uint256 value) external;
        function increase_unlock_time(uint256 unlockTime) external;
        function withdraw() external;
        function locked(address user) external view returns (int128 amount, uint256 end);
        function locked__end(address user) external view returns (uint256);
        function balanceOf(address user) external view returns (uint256);
        function token() external view returns (address);
    }

    interface IVeAllocate {
        function setAllocation(uint256 amount, address nft, uint256 chainId) external;
        function setBatchAllocation(uint256[] calldata amount, address[] calldata nft, uint256[] calldata chainId) external;
        function getveAllocation(address user, address nft, uint256 chainId) external view returns (uint256);
        function getTotalAllocation(address user) external view returns (uint256);
    }

    interface IVeFeeDistributor {
        function claim() external returns (uint256);
        function claim_many(address[20] calldata receivers) external returns (bool);
        function token() external view returns (address);
    }

    interface IVeFeeEstimate {
        function estimateClaim(address user) external view returns (uint256);
    }

    interface IDfRewards {
        function claimable(address to, address tokenAddress) external view returns (uint256);
        function claimFor(address to, address tokenAddress) external returns (uint256);
    }

    interface IDfStrategyV1 {
        function claimables(address to, address[] calldata tokenAddresses) external view returns (uint256[] memory);
        function claimMultiple(address to, address[] calldata tokenAddresses) external;
    }

    // ============================================
    // LEGACY WEIGHTED POOLS
    // ============================================

    interface IBFactory {
        function newBPool() external returns (address);

        event BPoolRegistered(address bpoolAddress, address indexed registeredBy);
    }

    interface IBPool {
        function setup(address dataTokenAaddress, uint256 dataTokenAmount, uint256 dataTokenWeight, address baseTokenAddress, uint256 baseTokenAmount, uint256 baseTokenWeight, uint256 swapFee) external;
        function bind(address token, uint256 balance, uint256 denorm) external;
        function setSwapFee(uint256 swapFee) external;
        function finalize() external;
        function swapExactAmountIn(address tokenIn, uint256 tokenAmountIn, address tokenOut, uint256 minAmountOut, uint256 maxPrice) external returns (uint256 tokenAmountOut, uint256 spotPriceAfter);
        function swapExactAmountOut(address tokenIn, uint256 maxAmountIn, address tokenOut, uint256 tokenAmountOut, uint256 maxPrice) external returns (uint256 tokenAmountIn, uint256 spotPriceAfter);
        function joinPool(uint256 poolAmountOut, uint256[] calldata maxAmountsIn) external;
        function exitPool(uint256 poolAmountIn, uint256[] calldata minAmountsOut) external;
        function joinswapExternAmountIn(address tokenIn, uint256 tokenAmountIn, uint256 minPoolAmountOut) external returns (uint256 poolAmountOut);
        function joinswapPoolAmountOut(address tokenIn, uint256 poolAmountOut, uint256 maxAmountIn) external returns (uint256 tokenAmountIn);
        function exitswapPoolAmountIn(address tokenOut, uint256 poolAmountIn, uint256 minAmountOut) external returns (uint256 tokenAmountOut);
        function exitswapExternAmountOut(address tokenOut, uint256 tokenAmountOut, uint256 maxPoolAmountIn) external returns (uint256 poolAmountIn);
        function getSpotPrice(address tokenIn, address tokenOut) external view returns (uint256);
        function getSpotPriceSansFee(address tokenIn, address tokenOut) external view returns (uint256);
        function getBalance(address token) external view returns (uint256);
        function getDenormalizedWeight(address token) external view returns (uint256);
        function getNormalizedWeight(address token) external view returns (uint256);
        function getSwapFee() external view returns (uint256);
        function getController() external view returns (address);
        function getCurrentTokens() external view returns (address[] memory);
        function getFinalTokens() external view returns (address[] memory);
        function isFinalized() external view returns (bool);
        function isBound(address token) external view returns (bool);
        function totalSupply() external view returns (uint256);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};
    use alloy_sol_types::{SolCall, SolValue};

    #[test]
    fn test_struct_arguments_expand_to_tuples() {
        assert_eq!(
            IERC20Template::startOrderCall::SIGNATURE,
            "startOrder(address,uint256,(address,address,uint256,uint8,bytes32,bytes32,uint256,bytes),(address,address,uint256))"
        );
        assert_eq!(
            IFactoryRouter::buyDTBatchCall::SIGNATURE,
            "buyDTBatch((bytes32,address,uint8,address,uint256,address,uint256,uint256,uint256,address)[])"
        );
        assert_eq!(
            IERC721Template::setMetaDataCall::SIGNATURE,
            "setMetaData(uint8,string,string,bytes,bytes,bytes32,(address,uint8,bytes32,bytes32)[])"
        );
    }

    #[test]
    fn test_struct_returns_decode() {
        let lock = EscrowLock {
            jobId: U256::from(7),
            payer: Address::with_last_byte(1),
            payee: Address::with_last_byte(2),
            amount: U256::from(100),
            expiry: U256::from(1_700_000_000u64),
            token: Address::with_last_byte(3),
        };
        let encoded = vec![lock.clone()].abi_encode();
        let decoded = IEscrow::getLocksCall::abi_decode_returns(&encoded).unwrap();
        assert_eq!(decoded, vec![lock]);
    }
}
